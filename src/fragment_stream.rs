//! Lazy, pull-based text stream over a provider's streamed response.
//!
//! A [`FragmentStream`] moves through these states:
//!
//! ```text
//! Unopened -> Connecting -> Streaming -> Exhausted
//!                  |            |
//!                  +------------+-----> Errored
//!  (any non-terminal state) ----------> Cancelled
//! ```
//!
//! No request is sent until the first poll. Only `Connecting` and `Streaming`
//! touch the provider; the last three states are terminal and every further
//! poll returns `None` without reaching the provider again.

use crate::provider::{EventStream, ResponsesProvider};
use crate::providers::openai::types::ResponsesRequest;
use crate::{Error, StreamEvent};
use futures::future::BoxFuture;
use futures::stream::FusedStream;
use futures_util::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

/// Observable state of a [`FragmentStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Constructed; no request has been sent.
    Unopened,
    /// Request sent; waiting for the provider to open the event stream.
    Connecting,
    /// Reading events from the open connection.
    Streaming,
    /// The provider ended the stream normally.
    Exhausted,
    /// A failure was returned to the caller.
    Errored,
    /// The caller abandoned the stream.
    Cancelled,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Exhausted | StreamState::Errored | StreamState::Cancelled
        )
    }
}

enum Phase {
    Unopened {
        provider: Arc<dyn ResponsesProvider>,
        request: ResponsesRequest,
    },
    Connecting(BoxFuture<'static, Result<EventStream, Error>>),
    Streaming(EventStream),
    Finished(StreamState),
}

/// The text fragments of a streamed completion, in arrival order.
///
/// Yields `Ok(fragment)` for each text delta the provider sends and skips
/// every other event. A failure is yielded once as [`Error::Stream`] and ends
/// the stream. Dropping the stream, or calling [`FragmentStream::cancel`],
/// closes the connection.
pub struct FragmentStream {
    phase: Phase,
    fragments: usize,
}

impl FragmentStream {
    /// Create a stream that will send `request` through `provider` on first poll.
    pub fn new(provider: Arc<dyn ResponsesProvider>, request: ResponsesRequest) -> Self {
        Self {
            phase: Phase::Unopened { provider, request },
            fragments: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        match &self.phase {
            Phase::Unopened { .. } => StreamState::Unopened,
            Phase::Connecting(_) => StreamState::Connecting,
            Phase::Streaming(_) => StreamState::Streaming,
            Phase::Finished(state) => *state,
        }
    }

    /// Abandon the stream. The connection, if any, is released and later
    /// polls return `None`. Has no effect on a stream that already ended.
    pub fn cancel(&mut self) {
        if !self.state().is_terminal() {
            tracing::debug!(fragments = self.fragments, "fragment stream cancelled");
            self.phase = Phase::Finished(StreamState::Cancelled);
        }
    }

    /// Drain the remaining fragments into one string.
    pub async fn collect_text(mut self) -> Result<String, Error> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    fn open(&mut self) {
        let unopened = std::mem::replace(&mut self.phase, Phase::Finished(StreamState::Errored));
        if let Phase::Unopened { provider, request } = unopened {
            tracing::debug!(model = %request.model, "opening response stream");
            let connect = async move { provider.stream(&request).await };
            self.phase = Phase::Connecting(Box::pin(connect));
        }
    }

    fn fail(&mut self, error: Error) -> Poll<Option<Result<String, Error>>> {
        tracing::warn!(error = %error, fragments = self.fragments, "response stream failed");
        self.phase = Phase::Finished(StreamState::Errored);
        Poll::Ready(Some(Err(Error::stream(error))))
    }
}

impl Stream for FragmentStream {
    type Item = Result<String, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.phase {
                Phase::Unopened { .. } => this.open(),
                Phase::Connecting(connect) => match ready!(connect.as_mut().poll(cx)) {
                    Ok(events) => this.phase = Phase::Streaming(events),
                    Err(e) => return this.fail(e),
                },
                Phase::Streaming(events) => match ready!(events.poll_next_unpin(cx)) {
                    Some(Ok(StreamEvent::TextDelta { delta })) => {
                        this.fragments += 1;
                        return Poll::Ready(Some(Ok(delta)));
                    }
                    Some(Ok(other)) => {
                        tracing::trace!(event = other.kind(), "skipping non-text stream event");
                    }
                    Some(Err(e)) => return this.fail(e),
                    None => {
                        tracing::debug!(fragments = this.fragments, "response stream exhausted");
                        this.phase = Phase::Finished(StreamState::Exhausted);
                        return Poll::Ready(None);
                    }
                },
                Phase::Finished(_) => return Poll::Ready(None),
            }
        }
    }
}

impl FusedStream for FragmentStream {
    fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }
}

impl fmt::Debug for FragmentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentStream")
            .field("state", &self.state())
            .field("fragments", &self.fragments)
            .finish()
    }
}
