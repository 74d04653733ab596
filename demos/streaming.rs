//! Stream a completion to stdout as it arrives, keeping conversation history.

use chat_driver::{ChatDriver, ChatDriverFactory, ChatMessage, ModelProvider, ModelTier};
use futures_util::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let driver = ChatDriverFactory::from_env().create(ModelTier::Standard, ModelProvider::OpenAI)?;
    let system = "You are a motor racing historian. Keep answers short.";

    let mut history = Vec::new();
    for question in [
        "Which circuit hosts the Monaco Grand Prix?",
        "How long is one lap of it?",
    ] {
        println!("> {question}");
        let mut fragments = driver.get_streamed_model_response(Some(system), question, &history);

        let mut answer = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            print!("{fragment}");
            std::io::stdout().flush()?;
            answer.push_str(&fragment);
        }
        println!("\n");

        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));
    }

    Ok(())
}
