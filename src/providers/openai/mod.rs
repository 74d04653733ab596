//! OpenAI Responses API provider.

pub mod client;
pub mod types;

pub use client::OpenAIProvider;
