//! Newline framing over a chunked byte stream.
//!
//! The conversation stream is only SSE-shaped: one `data: ` line per frame,
//! no event blocks. This yields raw lines and leaves payload handling to the
//! decoder.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use pin_project_lite::pin_project;

pin_project! {
    /// Splits a stream of byte chunks into text lines.
    ///
    /// A line may span any number of chunks. A trailing `\r` is dropped and a
    /// final unterminated line is flushed when the byte stream ends.
    pub struct LineStream<S> {
        #[pin]
        byte_stream: S,
        buffer: Vec<u8>,
        pending_lines: VecDeque<String>,
        finished: bool,
    }
}

impl<S, E> LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    pub fn new(byte_stream: S) -> Self {
        Self {
            byte_stream,
            buffer: Vec::new(),
            pending_lines: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<String, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if let Some(line) = this.pending_lines.pop_front() {
            return Poll::Ready(Some(Ok(line)));
        }
        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            match this.byte_stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.buffer.extend_from_slice(&chunk);

                    // Split on raw bytes so multi-byte characters cut by a
                    // chunk boundary are reassembled before decoding.
                    while let Some(pos) = this.buffer.iter().position(|&b| b == b'\n') {
                        let raw: Vec<u8> = this.buffer.drain(..=pos).collect();
                        this.pending_lines.push_back(decode_line(&raw[..pos]));
                    }

                    if let Some(line) = this.pending_lines.pop_front() {
                        return Poll::Ready(Some(Ok(line)));
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    *this.finished = true;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let line = decode_line(&this.buffer[..]);
                    this.buffer.clear();
                    return Poll::Ready(Some(Ok(line)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
