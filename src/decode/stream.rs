//! Incremental (`text/event-stream`) decoding.

use std::ops::ControlFlow;

use futures::{Stream, StreamExt};
use tracing::{debug, trace, warn};

use super::{DONE_SENTINEL, strip_frame_prefix};
use crate::error::{Error, Result};
use crate::models::ChatResponse;

/// How a decode run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The line source was exhausted. Carries the last decoded frame.
    Completed(Option<ChatResponse>),
    /// The frame sink asked to stop.
    Cancelled,
}

impl StreamOutcome {
    /// The final frame, if the stream ran to completion and produced one.
    pub fn into_response(self) -> Option<ChatResponse> {
        match self {
            Self::Completed(last) => last,
            Self::Cancelled => None,
        }
    }
}

/// Decode a stream of frame lines, handing each frame to `on_frame`.
///
/// `on_connect` fires once before the first read. Every frame is a full
/// snapshot of the answer so far and replaces the previous one. Lines that
/// fail to parse are skipped. The line source is consumed and dropped on
/// every return path, which closes the underlying connection.
pub async fn decode_stream<S, E, C, F>(
    lines: S,
    on_connect: C,
    mut on_frame: F,
) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<String, E>>,
    E: Into<Error>,
    C: FnOnce(),
    F: FnMut(&ChatResponse) -> Result<ControlFlow<()>>,
{
    let mut lines = std::pin::pin!(lines);
    on_connect();

    let mut last: Option<ChatResponse> = None;
    let mut frames = 0usize;
    let mut skipped = 0usize;

    while let Some(line) = lines.next().await {
        let line = line.map_err(Into::<Error>::into)?;
        let Some(payload) = strip_frame_prefix(&line) else {
            continue;
        };

        match serde_json::from_str::<ChatResponse>(payload) {
            Ok(frame) => {
                frames += 1;
                let flow = on_frame(&frame)?;
                last = Some(frame);
                if flow.is_break() {
                    debug!(frames, "Stream cancelled by frame sink");
                    return Ok(StreamOutcome::Cancelled);
                }
            }
            Err(_) if payload == DONE_SENTINEL => {
                trace!("End-of-stream marker received");
            }
            Err(e) => {
                skipped += 1;
                warn!(error = %e, line = payload, "Skipping malformed stream frame");
            }
        }
    }

    debug!(frames, skipped, "Stream completed");
    Ok(StreamOutcome::Completed(last))
}
