//! Buffered (`application/json`) response extraction.
//!
//! Even in buffered mode upstream sends one cumulative frame per line. Only
//! the last frame before the sentinel holds the complete answer.

use std::sync::LazyLock;

use tracing::trace;

use super::{DONE_LINE, strip_frame_prefix};
use crate::error::{Error, Result};
use crate::models::ChatResponse;

// The pattern is a literal; compiling it cannot fail.
#[allow(clippy::unwrap_used)]
static BLANK_LINES: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\n\s*\n").unwrap());

/// Extract the final frame from a fully buffered body.
pub fn extract(body: &[u8]) -> Result<ChatResponse> {
    let text = String::from_utf8_lossy(body);
    let collapsed = BLANK_LINES.replace_all(&text, "\n");
    let lines: Vec<&str> = collapsed
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let candidate = match lines.as_slice() {
        [.., before, last] if *last == DONE_LINE => *before,
        [last] if *last == DONE_LINE => {
            return Err(Error::MalformedBody(
                "body holds only the end-of-stream marker".into(),
            ));
        }
        [.., last] => *last,
        [] => return Err(Error::MalformedBody("empty body".into())),
    };

    trace!(lines = lines.len(), "Extracting final frame");

    let payload = strip_frame_prefix(candidate).ok_or_else(|| {
        Error::MalformedBody(format!("final line carries no payload: {candidate:?}"))
    })?;

    serde_json::from_str(payload).map_err(|source| Error::Decode {
        line: payload.to_string(),
        source,
    })
}
