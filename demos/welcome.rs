//! Expand a stored prompt template and ask for a complete answer.

use chat_driver::{
    ChatDriver, ChatDriverFactory, InMemoryPromptRepository, ModelProvider, ModelTier,
    PromptRepository, PromptTemplate,
};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let repo = InMemoryPromptRepository::new(vec![PromptTemplate::new(
        "welcome",
        "You are a friendly motor racing commentator. Mention the location exactly once.",
        "Welcome visitors to {LOCATION}",
    )]);
    let prompt = repo.get_prompt("welcome").ok_or("welcome prompt missing")?;

    let location = std::env::args().nth(1).unwrap_or_else(|| "Monaco".to_string());
    let variables = HashMap::from([("LOCATION".to_string(), location)]);
    let system = repo.expand_system_prompt(prompt, &HashMap::new());
    let user = repo.expand_user_prompt(prompt, &variables);

    let driver = ChatDriverFactory::from_env().create(ModelTier::Mini, ModelProvider::OpenAI)?;
    let answer = driver.get_model_response(Some(system.as_str()), &user, &[]).await?;
    println!("{answer}");

    Ok(())
}
