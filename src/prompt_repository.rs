//! Prompt template storage and `{PLACEHOLDER}` expansion.
//!
//! Expansion replaces every `{NAME}` token whose name is present in the supplied
//! variables. Tokens with no matching variable are left in the output exactly as
//! written, so a template can be expanded in stages or inspected afterwards for
//! anything that was not filled in.

use crate::types::PromptTemplate;
use crate::Error;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern compiles")
});

/// Substitute `{NAME}` tokens in `template` with values from `variables`.
///
/// Substitution is a single pass: a value that itself looks like a placeholder
/// is copied through and not expanded again.
pub fn expand_placeholders(template: &str, variables: &HashMap<String, String>) -> String {
    if variables.is_empty() {
        return template.to_string();
    }
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of all placeholder tokens in `template`, in order of appearance.
pub fn placeholder_names(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Read access to stored prompt templates.
pub trait PromptRepository: Send + Sync {
    /// Look up a template by id. Returns `None` for an unknown id.
    fn get_prompt(&self, id: &str) -> Option<&PromptTemplate>;

    /// Expand the system template of `prompt`.
    fn expand_system_prompt(
        &self,
        prompt: &PromptTemplate,
        variables: &HashMap<String, String>,
    ) -> String {
        expand_placeholders(&prompt.system_template, variables)
    }

    /// Expand the user template of `prompt`.
    fn expand_user_prompt(
        &self,
        prompt: &PromptTemplate,
        variables: &HashMap<String, String>,
    ) -> String {
        expand_placeholders(&prompt.user_template, variables)
    }
}

/// A prompt repository held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptRepository {
    prompts: HashMap<String, PromptTemplate>,
}

impl InMemoryPromptRepository {
    /// Build a repository from a list of templates. A later template replaces an
    /// earlier one with the same id.
    pub fn new(prompts: Vec<PromptTemplate>) -> Self {
        let mut repo = Self::default();
        for prompt in prompts {
            repo.insert(prompt);
        }
        repo
    }

    /// Load templates from a JSON array of prompt records.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let prompts: Vec<PromptTemplate> = serde_json::from_str(json)?;
        Ok(Self::new(prompts))
    }

    /// Load templates from a JSON file containing an array of prompt records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read prompt file {}: {e}", path.display()))
        })?;
        let repo = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), prompts = repo.len(), "loaded prompt templates");
        Ok(repo)
    }

    /// Add a template, returning the one it replaced, if any.
    pub fn insert(&mut self, prompt: PromptTemplate) -> Option<PromptTemplate> {
        self.prompts.insert(prompt.id.clone(), prompt)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl PromptRepository for InMemoryPromptRepository {
    fn get_prompt(&self, id: &str) -> Option<&PromptTemplate> {
        self.prompts.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn welcome_prompt() -> PromptTemplate {
        PromptTemplate::new(
            "template-prompt-002",
            "You are a motor racing commentator.",
            "Welcome visitors to {LOCATION}",
        )
    }

    #[test]
    fn test_expand_user_prompt_monaco() {
        let repo = InMemoryPromptRepository::new(vec![welcome_prompt()]);
        let prompt = repo.get_prompt("template-prompt-002").unwrap();

        let user = repo.expand_user_prompt(prompt, &vars(&[("LOCATION", "Monaco")]));
        assert_eq!(user, "Welcome visitors to Monaco");
        assert!(!user.contains("{LOCATION}"));
    }

    #[test]
    fn test_expand_system_prompt_without_variables() {
        let repo = InMemoryPromptRepository::new(vec![welcome_prompt()]);
        let prompt = repo.get_prompt("template-prompt-002").unwrap();

        let system = repo.expand_system_prompt(prompt, &HashMap::new());
        assert_eq!(system, "You are a motor racing commentator.");
    }

    #[test]
    fn test_unknown_placeholders_left_verbatim() {
        let out = expand_placeholders(
            "Drive from {FROM} to {TO} via {VIA}",
            &vars(&[("FROM", "Monza"), ("TO", "Imola")]),
        );
        assert_eq!(out, "Drive from Monza to Imola via {VIA}");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let out = expand_placeholders(
            "{NAME}, {NAME}, and {NAME} again",
            &vars(&[("NAME", "Ayrton")]),
        );
        assert_eq!(out, "Ayrton, Ayrton, and Ayrton again");
    }

    #[test]
    fn test_values_not_reexpanded() {
        let out = expand_placeholders(
            "{A} {B}",
            &vars(&[("A", "{B}"), ("B", "second")]),
        );
        assert_eq!(out, "{B} second");
    }

    #[test]
    fn test_non_identifier_braces_untouched() {
        let template = r#"Reply as {"name": "{NAME}"} with { spaces } and {}"#;
        let out = expand_placeholders(template, &vars(&[("NAME", "Lewis")]));
        assert_eq!(out, r#"Reply as {"name": "Lewis"} with { spaces } and {}"#);
    }

    #[test]
    fn test_expansion_does_not_mutate_template() {
        let repo = InMemoryPromptRepository::new(vec![welcome_prompt()]);
        let prompt = repo.get_prompt("template-prompt-002").unwrap();
        let _ = repo.expand_user_prompt(prompt, &vars(&[("LOCATION", "Silverstone")]));

        assert_eq!(repo.get_prompt("template-prompt-002"), Some(&welcome_prompt()));
    }

    #[test]
    fn test_get_prompt_unknown_id() {
        let repo = InMemoryPromptRepository::new(vec![welcome_prompt()]);
        assert!(repo.get_prompt("does-not-exist").is_none());
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("{A} then {B_2} then {A} and {not valid}"),
            vec!["A", "B_2", "A"]
        );
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut repo = InMemoryPromptRepository::new(vec![welcome_prompt()]);
        let replaced = repo.insert(PromptTemplate::new("template-prompt-002", "s", "u"));

        assert_eq!(replaced, Some(welcome_prompt()));
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get_prompt("template-prompt-002").unwrap().user_template, "u");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"[
            {"id": "p1", "systemPrompt": "sys {X}", "userPrompt": "user {Y}"},
            {"id": "p2", "systemPrompt": "", "userPrompt": "hello"}
        ]"#;
        let repo = InMemoryPromptRepository::from_json_str(json).unwrap();
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get_prompt("p1").unwrap().system_template, "sys {X}");
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        let result = InMemoryPromptRepository::from_json_str("{not json");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = InMemoryPromptRepository::from_json_file("/nonexistent/prompts.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
