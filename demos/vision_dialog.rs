//! Vision dialog example
//!
//! Sends an image URL together with a question using the blocking API.
//!
//! ```text
//! OPENAI_API_KEY=... cargo run --example vision_dialog -- https://example.com/photo.jpg
//! ```

use modelhub::{Dialog, Provider, SendRequest};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://upload.wikimedia.org/wikipedia/commons/a/a8/Tour_Eiffel_Wikimedia_Commons.jpg".to_string());

    let mut dialog = Dialog::from_provider(Provider::OpenAI, "gpt-4o-mini", "Describe images precisely")?;

    let outcome = dialog.send_blocking(
        SendRequest::new("What landmark is this? Answer with its name and city.")
            .image_urls(vec![url]),
    )?;

    println!("Response: {}", outcome.reply());
    println!("Estimated tokens in context: {}", dialog.token_count());

    Ok(())
}
