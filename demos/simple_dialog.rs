//! Simple dialog example
//!
//! Demonstrates a short multi-turn conversation with structured output.
//!
//! Set the provider's key (e.g. `OPENROUTER_API_KEY`) before running:
//!
//! ```text
//! cargo run --example simple_dialog -- openrouter openai/gpt-4o-mini
//! ```

use anyhow::Context as _;
use modelhub::{Dialog, Provider, SendRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let provider_name = args.next().unwrap_or_else(|| "openai".to_string());
    let model = args.next().unwrap_or_else(|| "gpt-4o-mini".to_string());
    let provider = Provider::from_str(&provider_name)
        .with_context(|| format!("unknown provider: {}", provider_name))?;

    let mut dialog = Dialog::from_provider(provider, model, "You are a concise geography tutor")?;
    dialog.set_temperature(0.2);

    println!("Sending first turn to {}...\n", dialog.provider());
    let outcome = dialog.send("What's the capital of France? Please be brief.").await?;
    println!("Response: {}", outcome.reply());

    let outcome = dialog
        .send(SendRequest::new("List three other large cities in that country").format_output(true))
        .await?;

    match outcome.reply().as_json() {
        Some(value) => println!("\nStructured reply:\n{:#}", value),
        None => println!("\nUnstructured reply: {}", outcome.reply()),
    }

    if let Some(cause) = outcome.cause() {
        println!("(recovered from: {})", cause);
    }

    println!(
        "\nHistory: {} messages, ~{} tokens",
        dialog.context().len(),
        dialog.token_count()
    );

    Ok(())
}
