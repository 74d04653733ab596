//! Types for streaming responses.

use crate::types::Usage;

/// Events a provider emits while streaming a response.
///
/// Only [`StreamEvent::TextDelta`] carries text for the caller; everything else
/// is metadata or control and is skipped by [`crate::FragmentStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The provider accepted the request and started a response.
    Created { response_id: String },
    /// A new output item (message, tool call, reasoning) was started.
    OutputItemAdded { item_type: String },
    /// An incremental chunk of output text.
    TextDelta { delta: String },
    /// An output item has finished.
    OutputItemDone { item_type: String },
    /// The response has finished.
    Completed { usage: Usage },
    /// Any other event type the provider sends.
    Other { kind: String },
}

impl StreamEvent {
    /// The text carried by this event, if any.
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta { delta } => Some(delta),
            _ => None,
        }
    }

    /// Short name of the event, for logging.
    pub fn kind(&self) -> &str {
        match self {
            StreamEvent::Created { .. } => "created",
            StreamEvent::OutputItemAdded { .. } => "output_item.added",
            StreamEvent::TextDelta { .. } => "output_text.delta",
            StreamEvent::OutputItemDone { .. } => "output_item.done",
            StreamEvent::Completed { .. } => "completed",
            StreamEvent::Other { kind } => kind,
        }
    }
}
