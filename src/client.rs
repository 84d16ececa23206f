//! Completion clients: the capability a dialog dispatches requests through
//!
//! A completion client turns the provider-neutral message list into generated
//! text. Two flavours exist, one per dialog path:
//!
//! - [`CompletionClient`] is awaited by [`Dialog::send`](crate::Dialog::send)
//! - [`BlockingCompletionClient`] blocks the calling thread inside
//!   [`Dialog::send_blocking`](crate::Dialog::send_blocking)
//!
//! [`HttpCompletionClient`] implements both against any OpenAI-compatible
//! `/chat/completions` endpoint. Which provider it talks to is decided entirely by
//! the [`ProviderConfig`] it is built from; there is no per-provider client type.
//!
//! Custom clients (test doubles, other transports) implement the traits directly
//! and are injected with [`DialogBuilder::clients`](crate::DialogBuilder::clients).

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::ProviderConfig;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, Content, Message, SamplingParams};
use crate::{Error, Result};

/// Non-blocking completion capability
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider tag used in diagnostics.
    fn provider(&self) -> &str;

    /// Whether a usable (non-empty) API key is configured.
    fn has_credential(&self) -> bool;

    /// Generate a reply for `messages`.
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        sampling: SamplingParams,
    ) -> Result<String>;
}

/// Blocking completion capability
pub trait BlockingCompletionClient: Send + Sync {
    /// Provider tag used in diagnostics.
    fn provider(&self) -> &str;

    /// Whether a usable (non-empty) API key is configured.
    fn has_credential(&self) -> bool;

    /// Generate a reply for `messages`, blocking the current thread.
    fn complete(
        &self,
        messages: &[Message],
        model: &str,
        sampling: SamplingParams,
    ) -> Result<String>;
}

/// HTTP client for OpenAI-compatible chat completion endpoints
///
/// Holds a pooled async `reqwest::Client` built at construction. The blocking
/// client is created on first blocking use, so a dialog that only ever awaits
/// never spins up reqwest's blocking runtime thread.
pub struct HttpCompletionClient {
    config: ProviderConfig,
    http: reqwest::Client,
    blocking_http: Mutex<Option<reqwest::blocking::Client>>,
}

impl std::fmt::Debug for HttpCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionClient")
            .field("config", &self.config)
            .finish()
    }
}

impl HttpCompletionClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built (TLS setup
    /// failure, invalid timeout).
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            blocking_http: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn blocking_http(&self) -> Result<reqwest::blocking::Client> {
        let mut slot = self
            .blocking_http
            .lock()
            .map_err(|_| Error::other("blocking HTTP client lock poisoned"))?;

        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        *slot = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    fn provider(&self) -> &str {
        self.config.provider.name()
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        sampling: SamplingParams,
    ) -> Result<String> {
        log_request(self.config.provider.name(), model, messages);

        let request = ChatCompletionRequest {
            model,
            messages,
            top_p: sampling.top_p,
            temperature: sampling.temperature,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        parse_completion(status, &body)
    }
}

impl BlockingCompletionClient for HttpCompletionClient {
    fn provider(&self) -> &str {
        self.config.provider.name()
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    fn complete(
        &self,
        messages: &[Message],
        model: &str,
        sampling: SamplingParams,
    ) -> Result<String> {
        log_request(self.config.provider.name(), model, messages);

        let request = ChatCompletionRequest {
            model,
            messages,
            top_p: sampling.top_p,
            temperature: sampling.temperature,
        };

        let response = self
            .blocking_http()?
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().map_err(map_transport_error)?;
        parse_completion(status, &body)
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout()
    } else {
        Error::Http(err)
    }
}

/// Turn a raw HTTP status and body into the reply text of the first choice.
fn parse_completion(status: StatusCode, body: &str) -> Result<String> {
    // Catches authentication failures, rate limits, invalid models, etc.
    if !status.is_success() {
        return Err(Error::api(format!("API error {}: {}", status, body)));
    }

    let response: ChatCompletionResponse = serde_json::from_str(body)?;
    response
        .into_text()
        .ok_or_else(|| Error::api("completion response contained no choices"))
}

fn log_request(provider: &str, model: &str, messages: &[Message]) {
    log::debug!(
        "Dispatching {} message(s) to {} (model: {})",
        messages.len(),
        provider,
        model
    );

    for msg in messages {
        let Content::Parts(parts) = &msg.content else {
            continue;
        };
        for part in parts {
            if let crate::types::ContentPart::ImageUrl { image_url } = part {
                // Truncate data URLs so base64 blobs don't flood the log
                let url = &image_url.url;
                let url_display = if url.len() > 100 {
                    let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
                    format!("{}... ({} chars)", &url[..cut], url.len())
                } else {
                    url.clone()
                };
                log::debug!("  - Image ({:?} turn): {}", msg.role, url_display);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    #[test]
    fn test_client_creation() {
        let client = HttpCompletionClient::new(ProviderConfig::new(Provider::OpenAI, "sk-test"))
            .expect("Should create client successfully");
        assert_eq!(CompletionClient::provider(&client), "openai");
        assert!(CompletionClient::has_credential(&client));
    }

    #[test]
    fn test_client_without_key_has_no_credential() {
        let client =
            HttpCompletionClient::new(ProviderConfig::new(Provider::Volc, "")).unwrap();
        assert!(!BlockingCompletionClient::has_credential(&client));
        assert_eq!(BlockingCompletionClient::provider(&client), "volc");
    }

    #[test]
    fn test_endpoint_joins_trailing_slash() {
        let config = ProviderConfig::new(Provider::Custom, "k").with_base_url("http://localhost:1234/v1/");
        let client = HttpCompletionClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_parse_completion_success() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#;
        assert_eq!(parse_completion(StatusCode::OK, body).unwrap(), "hi there");
    }

    #[test]
    fn test_parse_completion_http_error() {
        let err = parse_completion(StatusCode::UNAUTHORIZED, "bad key").unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn test_parse_completion_malformed_body() {
        let err = parse_completion(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let err = parse_completion(StatusCode::OK, r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let config = ProviderConfig::new(Provider::Custom, "k")
            .with_base_url("http://127.0.0.1:9/v1")
            .with_timeout(std::time::Duration::from_secs(2));
        let client = HttpCompletionClient::new(config).unwrap();

        let result =
            CompletionClient::complete(&client, &[Message::user("hi")], "m", SamplingParams::default())
                .await;
        let err = result.unwrap_err();
        assert!(!err.is_fatal());
    }
}
