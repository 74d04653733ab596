use crate::types::Usage;
use serde::{Deserialize, Serialize};

/// OpenAI input item format for the Responses API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputMessage {
    #[serde(rename = "message")]
    Message { role: String, content: String },
}

impl InputMessage {
    pub fn message(role: impl Into<String>, content: impl Into<String>) -> Self {
        InputMessage::Message {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Output format settings for the Responses API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

/// Requested output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    /// Output must be JSON conforming to `schema`. With `strict`, the provider
    /// refuses extra fields and requires every required field.
    JsonSchema {
        name: String,
        strict: bool,
        schema: serde_json::Value,
    },
}

/// OpenAI Responses API request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
}

/// OpenAI Responses API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub output: Vec<ResponseOutput>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub error: Option<ErrorDetails>,
}

impl ResponsesResponse {
    /// All `output_text` parts of all message items, concatenated in order.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.r#type == "message")
            .flat_map(|item| item.content.iter().flatten())
            .filter(|part| part.r#type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    /// The refusal message, if the model declined to answer.
    pub fn refusal(&self) -> Option<&str> {
        self.output
            .iter()
            .flat_map(|item| item.content.iter().flatten())
            .find(|part| part.r#type == "refusal")
            .and_then(|part| part.refusal.as_deref())
    }
}

/// Output item in a Responses API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseOutput {
    pub r#type: String, // "message", "function_call", "reasoning", ...
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<ResponseContent>>,
}

/// Content part of an output item.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseContent {
    pub r#type: String, // "output_text" or "refusal"
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

/// OpenAI error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
    pub error: ErrorDetails,
}

/// Error details from OpenAI API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Item header carried by `response.output_item.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseItem {
    pub r#type: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// OpenAI streaming Responses API event.
///
/// Only the events the adapter distinguishes are modelled; everything else
/// lands in `Unknown`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesStreamEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponsesResponse },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded { item: ResponseItem },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { item: ResponseItem },
    #[serde(rename = "response.completed")]
    Completed { response: ResponsesResponse },
    #[serde(rename = "response.failed")]
    Failed { response: ResponsesResponse },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// Just the discriminant of a stream event.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamEventKind {
    #[serde(rename = "type")]
    pub kind: String,
}
