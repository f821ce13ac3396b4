//! Frame decoding for both upstream response modes.
//!
//! Each line is `data: ` followed by a JSON [`ChatResponse`](crate::models::ChatResponse)
//! holding the whole answer so far. The last line may be `data: [DONE]`.

pub mod stream;
pub mod text;

pub use stream::{StreamOutcome, decode_stream};
pub use text::extract;

/// Prefix on every frame line.
pub const DATA_PREFIX: &str = "data: ";

/// Terminal marker, after the prefix is removed.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Terminal marker line as it appears on the wire.
pub const DONE_LINE: &str = "data: [DONE]";

/// Payload of a frame line: everything after the 6-byte prefix.
///
/// Returns `None` for lines too short to carry a payload. The prefix bytes
/// are not checked, matching what upstream actually guarantees.
pub fn strip_frame_prefix(line: &str) -> Option<&str> {
    if line.len() <= DATA_PREFIX.len() {
        return None;
    }
    line.get(DATA_PREFIX.len()..)
}
