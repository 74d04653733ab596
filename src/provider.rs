use crate::providers::openai::types::{ResponsesRequest, ResponsesResponse};
use crate::{Error, StreamEvent};
use futures_util::Stream;
use std::pin::Pin;

/// A stream of provider events for a single streamed request.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// A client for a Responses-style completion API.
///
/// Drivers talk to the provider only through this trait; each method performs
/// exactly one request and never retries.
#[async_trait::async_trait]
pub trait ResponsesProvider: Send + Sync + 'static {
    /// Send a request and wait for the complete response.
    async fn create(&self, request: &ResponsesRequest) -> Result<ResponsesResponse, Error>;

    /// Send a request in streaming mode and return the open event stream.
    async fn stream(&self, request: &ResponsesRequest) -> Result<EventStream, Error>;

    /// Send a schema-constrained request and return the parsed JSON output,
    /// or `None` when the response carries no output to parse.
    async fn parse(
        &self,
        request: &ResponsesRequest,
    ) -> Result<Option<serde_json::Value>, Error>;
}
