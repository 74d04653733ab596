use serde::{Deserialize, Serialize};

/// A stored prompt: a system template and a user template, both of which may
/// contain `{PLACEHOLDER}` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    #[serde(rename = "systemPrompt", alias = "systemTemplate")]
    pub system_template: String,
    #[serde(rename = "userPrompt", alias = "userTemplate")]
    pub user_template: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(
        id: impl Into<String>,
        system_template: impl Into<String>,
        user_template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            system_template: system_template.into(),
            user_template: user_template.into(),
        }
    }
}
