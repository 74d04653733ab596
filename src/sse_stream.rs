//! Server-Sent Events parsing over a byte stream.
//!
//! Events are separated by a blank line. Chunk boundaries may fall anywhere,
//! including inside a multi-byte UTF-8 character, so raw bytes are buffered
//! until a full event is available.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on buffered bytes for a single unfinished event.
const MAX_BUFFERED_BYTES: usize = 1_000_000;

const EVENT_SEPARATOR: &[u8] = b"\n\n";

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Create a new SSE event with just data.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
            id: None,
        }
    }

    /// OpenAI-style terminal sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse one complete event block. Returns `None` when the block has no
    /// `data` field (comments, keep-alives).
    fn parse(block: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut id = None;
        let mut data: Option<String> = None;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => event_type = Some(value.to_string()),
                "id" => id = Some(value.to_string()),
                "data" => match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                _ => {}
            }
        }

        data.map(|data| SseEvent {
            event_type,
            data,
            id,
        })
    }
}

/// Parses SSE events out of a stream of byte chunks.
///
/// A failure (transport error, invalid UTF-8, oversized event) is yielded
/// after every event framed before it, and ends the stream.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<SseEvent>,
    failure: Option<Error>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            failure: None,
            finished: false,
        }
    }

    /// Append a chunk, dropping carriage returns so CRLF and LF framing parse alike.
    fn push_chunk(&mut self, chunk: &[u8]) {
        if memchr::memchr(b'\r', chunk).is_some() {
            self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        } else {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Move every complete event from the buffer into `pending`.
    fn drain_complete_events(&mut self) -> Result<(), Error> {
        let finder = memmem::Finder::new(EVENT_SEPARATOR);
        let mut consumed = 0;
        let mut result = Ok(());

        while let Some(pos) = finder.find(&self.buffer[consumed..]) {
            let block = &self.buffer[consumed..consumed + pos];
            consumed += pos + EVENT_SEPARATOR.len();
            match decode_block(block) {
                Ok(Some(event)) => self.pending.push_back(event),
                Ok(None) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        result
    }

    /// Whatever is left when the byte stream ends, parsed as a final event.
    fn take_trailing_event(&mut self) -> Result<Option<SseEvent>, Error> {
        let trailing = std::mem::take(&mut self.buffer);
        decode_block(&trailing)
    }

    fn fail(&mut self, error: Error) {
        self.buffer.clear();
        self.finished = true;
        self.failure = Some(error);
    }
}

fn decode_block(block: &[u8]) -> Result<Option<SseEvent>, Error> {
    let text = std::str::from_utf8(block)
        .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(SseEvent::parse(text))
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if let Some(error) = self.failure.take() {
                return Poll::Ready(Some(Err(error)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.push_chunk(&chunk);
                    if let Err(e) = self.drain_complete_events() {
                        self.fail(e);
                        continue;
                    }
                    // Only the unfinished tail is left in the buffer here.
                    if self.buffer.len() > MAX_BUFFERED_BYTES {
                        let bytes = self.buffer.len();
                        tracing::warn!(bytes, "SSE event exceeded buffer limit");
                        self.fail(Error::streaming("SSE buffer exceeded maximum size"));
                    }
                }
                Some(Err(e)) => {
                    self.fail(Error::streaming(format!("Connection error: {e}")));
                }
                None => {
                    self.finished = true;
                    match self.take_trailing_event() {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => {}
                        Err(e) => self.failure = Some(e),
                    }
                }
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE events.
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}
