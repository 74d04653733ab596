//! Chat drivers: one model, three ways to ask it something.

use crate::fragment_stream::FragmentStream;
use crate::provider::ResponsesProvider;
use crate::providers::openai::types::{InputMessage, ResponsesRequest, TextConfig, TextFormat};
use crate::types::{ChatMessage, ModelTier, DEFAULT_TEMPERATURE};
use crate::Error;
use serde::de::DeserializeOwned;
use std::iter;
use std::sync::Arc;

/// Schema name sent with constrained requests.
const CONSTRAINED_OUTPUT_NAME: &str = "constrainedOutput";

/// A model bound to a provider.
///
/// `history` is the prior conversation, oldest first. It is only read: the new
/// user turn is appended to a request-local copy.
#[async_trait::async_trait]
pub trait ChatDriver: Send + Sync {
    /// The resolved model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Ask for a complete text answer.
    ///
    /// Fails with [`Error::Content`] if the provider answers with no text.
    async fn get_model_response(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, Error>;

    /// Ask for the answer as a lazy stream of text fragments.
    ///
    /// Nothing is sent until the returned stream is first polled.
    fn get_streamed_model_response(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> FragmentStream;

    /// Ask for output conforming to `json_schema` (strict mode) and return it
    /// as raw JSON, or `None` if the provider produced nothing to parse.
    async fn get_constrained_model_value(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        json_schema: &serde_json::Value,
        history: &[ChatMessage],
    ) -> Result<Option<serde_json::Value>, Error>;
}

/// Typed access to constrained responses for any [`ChatDriver`].
#[async_trait::async_trait]
pub trait ChatDriverExt: ChatDriver {
    /// Ask for output conforming to `json_schema` and decode it as `T`.
    ///
    /// Unlike [`ChatDriver::get_model_response`], a missing answer is not an
    /// error: the call resolves to `default_value` instead.
    async fn get_constrained_model_response<T>(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        json_schema: &serde_json::Value,
        default_value: T,
        history: &[ChatMessage],
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let value = self
            .get_constrained_model_value(system_prompt, user_prompt, json_schema, history)
            .await?;

        match value {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => {
                tracing::warn!(model = self.model(), "no structured output, using default value");
                Ok(default_value)
            }
        }
    }
}

impl<D: ChatDriver + ?Sized> ChatDriverExt for D {}

/// Chat driver for the OpenAI Responses API.
pub struct OpenAIChatDriver {
    provider: Arc<dyn ResponsesProvider>,
    model: String,
    temperature: f32,
}

impl OpenAIChatDriver {
    /// Create a driver for `tier` that sends requests through `provider`.
    pub fn new(provider: Arc<dyn ResponsesProvider>, tier: ModelTier) -> Self {
        Self {
            provider,
            model: tier.openai_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the request: history, then the new user turn.
    fn build_request(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> ResponsesRequest {
        let turn = ChatMessage::user(user_prompt);
        let input = history
            .iter()
            .chain(iter::once(&turn))
            .map(|msg| InputMessage::message(msg.role().as_str(), msg.content()))
            .collect();

        ResponsesRequest {
            model: self.model.clone(),
            input,
            instructions: system_prompt
                .filter(|prompt| !prompt.is_empty())
                .map(str::to_string),
            temperature: Some(self.temperature),
            text: None,
            stream: None,
            store: Some(false),
        }
    }
}

#[async_trait::async_trait]
impl ChatDriver for OpenAIChatDriver {
    fn model(&self) -> &str {
        &self.model
    }

    async fn get_model_response(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, Error> {
        let request = self.build_request(system_prompt, user_prompt, history);
        let response = self.provider.create(&request).await?;

        let text = response.output_text();
        if text.is_empty() {
            tracing::warn!(model = %self.model, response_id = %response.id, "empty response text");
            return Err(Error::content("No response content received from OpenAI"));
        }
        Ok(text)
    }

    fn get_streamed_model_response(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> FragmentStream {
        let request = self.build_request(system_prompt, user_prompt, history);
        FragmentStream::new(self.provider.clone(), request)
    }

    async fn get_constrained_model_value(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        json_schema: &serde_json::Value,
        history: &[ChatMessage],
    ) -> Result<Option<serde_json::Value>, Error> {
        let mut request = self.build_request(system_prompt, user_prompt, history);
        request.text = Some(TextConfig {
            format: TextFormat::JsonSchema {
                name: CONSTRAINED_OUTPUT_NAME.to_string(),
                strict: true,
                schema: json_schema.clone(),
            },
        });
        self.provider.parse(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EventStream;
    use crate::providers::openai::types::ResponsesResponse;
    use crate::types::ChatRole;
    use crate::StreamEvent;
    use futures_util::{stream, StreamExt};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers from canned values.
    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<ResponsesRequest>>,
        text: Option<String>,
        parsed: Option<serde_json::Value>,
        fail: bool,
    }

    impl RecordingProvider {
        fn record(&self, request: &ResponsesRequest) -> Result<(), Error> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(Error::provider("OpenAI", "API error (500): boom"));
            }
            Ok(())
        }

        fn last_request(&self) -> ResponsesRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ResponsesProvider for RecordingProvider {
        async fn create(&self, request: &ResponsesRequest) -> Result<ResponsesResponse, Error> {
            self.record(request)?;
            let output = match &self.text {
                Some(text) => json!([{
                    "type": "message",
                    "content": [{"type": "output_text", "text": text}]
                }]),
                None => json!([]),
            };
            Ok(serde_json::from_value(json!({"id": "resp_test", "output": output})).unwrap())
        }

        async fn stream(&self, request: &ResponsesRequest) -> Result<EventStream, Error> {
            self.record(request)?;
            let text = self.text.clone().unwrap_or_default();
            let events = text
                .split_inclusive(' ')
                .map(|word| {
                    Ok(StreamEvent::TextDelta {
                        delta: word.to_string(),
                    })
                })
                .collect::<Vec<Result<StreamEvent, Error>>>();
            Ok(Box::pin(stream::iter(events)))
        }

        async fn parse(
            &self,
            request: &ResponsesRequest,
        ) -> Result<Option<serde_json::Value>, Error> {
            self.record(request)?;
            Ok(self.parsed.clone())
        }
    }

    fn driver(provider: &Arc<RecordingProvider>) -> OpenAIChatDriver {
        OpenAIChatDriver::new(provider.clone(), ModelTier::Large)
    }

    #[tokio::test]
    async fn test_request_appends_user_turn_after_history() {
        let provider = Arc::new(RecordingProvider {
            text: Some("Welcome to Monaco!".to_string()),
            ..Default::default()
        });
        let history = vec![
            ChatMessage::user("Who won in 1988?"),
            ChatMessage::assistant("Ayrton Senna."),
        ];
        let before = history.clone();

        let answer = driver(&provider)
            .get_model_response(Some("Be brief."), "Welcome visitors to Monaco", &history)
            .await
            .unwrap();
        assert_eq!(answer, "Welcome to Monaco!");
        assert_eq!(history, before);

        let request = provider.last_request();
        assert_eq!(request.model, "gpt-4.1");
        assert_eq!(request.instructions.as_deref(), Some("Be brief."));
        assert_eq!(request.temperature, Some(0.25));
        assert_eq!(
            request.input,
            vec![
                InputMessage::message("user", "Who won in 1988?"),
                InputMessage::message("assistant", "Ayrton Senna."),
                InputMessage::message("user", "Welcome visitors to Monaco"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_system_prompt_omitted() {
        let provider = Arc::new(RecordingProvider {
            text: Some("ok".to_string()),
            ..Default::default()
        });
        let driver = driver(&provider);

        driver.get_model_response(Some(""), "hi", &[]).await.unwrap();
        assert!(provider.last_request().instructions.is_none());

        driver.get_model_response(None, "hi", &[]).await.unwrap();
        assert!(provider.last_request().instructions.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_is_content_error() {
        let provider = Arc::new(RecordingProvider::default());
        let err = driver(&provider)
            .get_model_response(None, "hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Content(_)));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        let err = driver(&provider)
            .get_model_response(None, "hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_streamed_response_is_lazy() {
        let provider = Arc::new(RecordingProvider {
            text: Some("Welcome to Monaco".to_string()),
            ..Default::default()
        });
        let fragments = driver(&provider).get_streamed_model_response(None, "hi", &[]);
        assert!(provider.requests.lock().unwrap().is_empty());

        let collected: Vec<String> = fragments.map(|f| f.unwrap()).collect().await;
        assert_eq!(collected, vec!["Welcome ", "to ", "Monaco"]);
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        location: String,
        is_circuit: bool,
    }

    fn verdict_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string"},
                "is_circuit": {"type": "boolean"}
            },
            "required": ["location", "is_circuit"],
            "additionalProperties": false
        })
    }

    #[tokio::test]
    async fn test_constrained_response_decodes() {
        let provider = Arc::new(RecordingProvider {
            parsed: Some(json!({"location": "Silverstone", "is_circuit": true})),
            ..Default::default()
        });
        let default = Verdict {
            location: String::new(),
            is_circuit: false,
        };

        let verdict = driver(&provider)
            .get_constrained_model_response(
                None,
                "Classify Silverstone",
                &verdict_schema(),
                default,
                &[],
            )
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Verdict {
                location: "Silverstone".to_string(),
                is_circuit: true
            }
        );

        let request = provider.last_request();
        assert_eq!(
            request.text,
            Some(TextConfig {
                format: TextFormat::JsonSchema {
                    name: "constrainedOutput".to_string(),
                    strict: true,
                    schema: verdict_schema(),
                }
            })
        );
    }

    #[tokio::test]
    async fn test_constrained_response_falls_back_to_default() {
        // Empty text fails the plain call but not the constrained one.
        let provider = Arc::new(RecordingProvider::default());
        let default = Verdict {
            location: "unknown".to_string(),
            is_circuit: false,
        };

        let verdict = driver(&provider)
            .get_constrained_model_response(None, "Classify", &verdict_schema(), default, &[])
            .await
            .unwrap();
        assert_eq!(verdict.location, "unknown");
    }

    #[tokio::test]
    async fn test_constrained_response_shape_mismatch_is_error() {
        let provider = Arc::new(RecordingProvider {
            parsed: Some(json!({"location": 7})),
            ..Default::default()
        });
        let default = Verdict {
            location: String::new(),
            is_circuit: false,
        };

        let result = driver(&provider)
            .get_constrained_model_response(None, "Classify", &verdict_schema(), default, &[])
            .await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_constrained_via_trait_object() {
        let provider = Arc::new(RecordingProvider {
            parsed: Some(json!(["a", "b"])),
            ..Default::default()
        });
        let boxed: Box<dyn ChatDriver> = Box::new(driver(&provider));

        let schema = json!({"type": "array"});
        let items: Vec<String> = boxed
            .get_constrained_model_response(None, "List", &schema, Vec::new(), &[])
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_history_roles_mapped() {
        let provider = Arc::new(RecordingProvider::default());
        let history = [ChatMessage::new(ChatRole::Assistant, "Earlier answer")];
        let request = driver(&provider).build_request(None, "Next question", &history);

        assert_eq!(request.input[0], InputMessage::message("assistant", "Earlier answer"));
        assert_eq!(request.input[1], InputMessage::message("user", "Next question"));
        assert_eq!(request.store, Some(false));
        assert!(request.stream.is_none());
    }
}
