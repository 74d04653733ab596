//! Chat completions over the OpenAI Responses API, with prompt templates.
//!
//! The library offers three ways to ask a model something through a
//! [`ChatDriver`]: a complete text answer, a lazy stream of text fragments
//! ([`FragmentStream`]), and a schema-constrained answer decoded into a typed
//! value. Prompts can be kept in a [`PromptRepository`] and filled in with
//! runtime variables before they are sent.

pub mod driver;
pub mod error;
pub mod factory;
pub mod fragment_stream;
pub mod prompt_repository;
pub mod provider;
pub mod providers;
pub mod sse_stream;
pub mod types;

// Re-export core types for easy usage
pub use driver::{ChatDriver, ChatDriverExt, OpenAIChatDriver};
pub use error::Error;
pub use factory::ChatDriverFactory;
pub use fragment_stream::{FragmentStream, StreamState};
pub use prompt_repository::{
    expand_placeholders, placeholder_names, InMemoryPromptRepository, PromptRepository,
};
pub use provider::{EventStream, ResponsesProvider};
pub use providers::*;
pub use sse_stream::SseEvent;
pub use types::*;
