use crate::types::ModelProvider;
use thiserror::Error;

/// Errors that can occur when using the chat-driver library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(ModelProvider),

    /// The provider answered, but the answer had nothing usable in it.
    #[error("Missing content: {0}")]
    Content(String),

    #[error("Streaming error: {0}")]
    Streaming(String),

    /// A failure surfaced while pulling from a [`crate::FragmentStream`].
    /// The stream is terminated once this is returned.
    #[error("Stream error: {0}")]
    Stream(#[source] Box<Error>),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn content(message: impl Into<String>) -> Self {
        Error::Content(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    /// Wrap an error as a stream error. Already-wrapped errors are returned as is.
    pub fn stream(inner: Error) -> Self {
        match inner {
            Error::Stream(_) => inner,
            other => Error::Stream(Box::new(other)),
        }
    }

    /// The innermost cause of a [`Error::Stream`], or `self` for any other variant.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stream(inner) => inner.root(),
            other => other,
        }
    }
}
