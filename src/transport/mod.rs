//! Wire-level plumbing: HTTP, headers, line framing and status handling.

pub mod headers;
pub mod http;
pub mod lines;
pub mod status;

pub use http::HttpTransport;
pub use lines::LineStream;
pub use status::ensure_success;

/// The `accept` value selecting the upstream response mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptMode {
    /// One buffered body of `data: ` lines.
    Json,
    /// The same lines delivered incrementally.
    EventStream,
}

impl AcceptMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::EventStream => "text/event-stream",
        }
    }
}

impl std::fmt::Display for AcceptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
