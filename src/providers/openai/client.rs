use super::types::{
    OpenAIError, ResponsesRequest, ResponsesResponse, ResponsesStreamEvent, StreamEventKind,
};
use crate::provider::{EventStream, ResponsesProvider};
use crate::sse_stream::SseStreamExt;
use crate::types::{DriverConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_TIMEOUT, OPENAI_API_KEY_VAR};
use crate::{Error, StreamEvent};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const PROVIDER_NAME: &str = "OpenAI";

/// OpenAI Responses API client.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI client against the public API.
    ///
    /// A missing key is accepted here and reported on the first request.
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, DEFAULT_OPENAI_BASE_URL.to_string())
    }

    /// Create a new OpenAI client with custom base URL.
    pub fn new_with_base_url(api_key: Option<String>, base_url: String) -> Result<Self, Error> {
        Self::build(api_key, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client from driver configuration.
    pub fn from_config(config: &DriverConfig) -> Result<Self, Error> {
        Self::build(config.api_key.clone(), config.base_url.clone(), config.timeout)
    }

    fn build(api_key: Option<String>, base_url: String, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> Result<&str, Error> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!("{OPENAI_API_KEY_VAR} environment variable is not set"))
            })
    }

    /// POST the request and check the status. Errors here are provider errors.
    async fn send(&self, request: &ResponsesRequest) -> Result<reqwest::Response, Error> {
        let api_key = self.api_key()?;

        tracing::debug!(
            model = %request.model,
            messages = request.input.len(),
            stream = request.stream.unwrap_or(false),
            constrained = request.text.is_some(),
            "sending OpenAI responses request"
        );

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAIError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(%status, %message, "OpenAI request rejected");
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("API error ({status}): {message}"),
            ));
        }

        Ok(response)
    }

    /// Convert one SSE payload into a stream event.
    ///
    /// Malformed payloads and provider-reported failures become errors.
    /// Well-formed events of an unrecognised type pass through as
    /// [`StreamEvent::Other`].
    fn convert_stream_event(data: &str) -> Option<Result<StreamEvent, Error>> {
        let event = match serde_json::from_str::<ResponsesStreamEvent>(data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "malformed stream payload");
                return Some(Err(Error::streaming(format!("Invalid stream event: {e}"))));
            }
        };

        let converted = match event {
            ResponsesStreamEvent::Created { response } => Ok(StreamEvent::Created {
                response_id: response.id,
            }),
            ResponsesStreamEvent::OutputItemAdded { item } => Ok(StreamEvent::OutputItemAdded {
                item_type: item.r#type,
            }),
            ResponsesStreamEvent::OutputTextDelta { delta } => Ok(StreamEvent::TextDelta { delta }),
            ResponsesStreamEvent::OutputItemDone { item } => Ok(StreamEvent::OutputItemDone {
                item_type: item.r#type,
            }),
            ResponsesStreamEvent::Completed { response } => Ok(StreamEvent::Completed {
                usage: response.usage.unwrap_or_default(),
            }),
            ResponsesStreamEvent::Failed { response } => {
                let message = response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "response failed".to_string());
                Err(Error::provider(PROVIDER_NAME, message))
            }
            ResponsesStreamEvent::Error { code, message } => {
                let message = match code {
                    Some(code) => format!("{code}: {message}"),
                    None => message,
                };
                Err(Error::provider(PROVIDER_NAME, message))
            }
            ResponsesStreamEvent::Unknown => {
                let kind = serde_json::from_str::<StreamEventKind>(data)
                    .map(|k| k.kind)
                    .unwrap_or_default();
                Ok(StreamEvent::Other { kind })
            }
        };

        Some(converted)
    }
}

#[async_trait::async_trait]
impl ResponsesProvider for OpenAIProvider {
    async fn create(&self, request: &ResponsesRequest) -> Result<ResponsesResponse, Error> {
        let response = self.send(request).await?;
        let body: ResponsesResponse = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Invalid response body: {e}"))
        })?;

        if let Some(error) = &body.error {
            return Err(Error::provider(PROVIDER_NAME, error.message.clone()));
        }

        Ok(body)
    }

    async fn stream(&self, request: &ResponsesRequest) -> Result<EventStream, Error> {
        let mut request = request.clone();
        request.stream = Some(true);

        let response = self.send(&request).await?;

        let event_stream = response
            .bytes_stream()
            .sse_events()
            .take_while(|sse_result| {
                let done = matches!(sse_result, Ok(event) if event.is_done());
                futures_util::future::ready(!done)
            })
            .filter_map(|sse_result| async move {
                match sse_result {
                    Ok(sse_event) => Self::convert_stream_event(&sse_event.data),
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(Box::pin(event_stream))
    }

    async fn parse(
        &self,
        request: &ResponsesRequest,
    ) -> Result<Option<serde_json::Value>, Error> {
        let response = self.create(request).await?;

        if let Some(refusal) = response.refusal() {
            tracing::warn!(%refusal, "model refused constrained request");
            return Ok(None);
        }

        let text = response.output_text();
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }
}
