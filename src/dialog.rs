//! Dialog: drives one conversation through request, dispatch, and history update
//!
//! A [`Dialog`] owns a [`Context`] and a pair of completion clients (one async,
//! one blocking). Each call to [`Dialog::send`] or [`Dialog::send_blocking`]
//! runs the same cycle:
//!
//! 1. Append the user turn (an image turn if images are given, otherwise the text
//!    if it is non-empty)
//! 2. Append the JSON formatting instruction if structured output was requested
//! 3. Check that the client has a credential (fatal if not)
//! 4. Dispatch the whole history
//! 5. Append the assistant turn, empty if dispatch failed
//! 6. Optionally extract JSON from the reply
//!
//! # Failure Policy
//!
//! Only argument and credential problems are returned as `Err`. Failures at the
//! network or model boundary are logged and recovered: the caller gets a
//! [`SendOutcome::Recovered`] carrying an empty (or unparsed) reply plus the
//! cause, and the history still gains its assistant turn so the conversation
//! stays well-formed. Nothing is retried automatically; calling `send` again
//! resends the existing history.
//!
//! # Examples
//!
//! ```rust,no_run
//! use modelhub::{Dialog, Provider, SendRequest};
//!
//! # async fn example() -> modelhub::Result<()> {
//! let mut dialog = Dialog::from_provider(Provider::OpenRouter, "openai/gpt-4o", "Answer briefly")?;
//!
//! let outcome = dialog.send("What's the capital of France?").await?;
//! println!("{}", outcome.reply());
//!
//! let outcome = dialog
//!     .send(SendRequest::new("List three French cities").format_output(true))
//!     .await?;
//! if let Some(value) = outcome.reply().as_json() {
//!     println!("{:#}", value);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::client::{BlockingCompletionClient, CompletionClient, HttpCompletionClient};
use crate::config::{Provider, ProviderConfig};
use crate::context::Context;
use crate::extract::{DEFAULT_EXTRACTORS, Reply, try_extract_json};
use crate::tokens::{HeuristicEncoder, TokenEncoder};
use crate::types::{Message, SamplingParams};
use crate::{Error, Result};

/// Instruction appended as the final user turn when structured output is requested.
pub const JSON_FORMAT_INSTRUCTION: &str =
    "Format your entire response as valid JSON. Reply with the JSON only.";

/// Inputs of one send call
///
/// Converts from `&str`/`String` for the plain-text case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendRequest {
    pub message: String,
    /// Base64-encoded PNG blobs
    pub images: Option<Vec<String>>,
    /// Remote image URLs; ignored when `images` is non-empty
    pub image_urls: Option<Vec<String>>,
    pub format_output: bool,
}

impl SendRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = Some(urls);
        self
    }

    pub fn format_output(mut self, enabled: bool) -> Self {
        self.format_output = enabled;
        self
    }
}

impl From<&str> for SendRequest {
    fn from(message: &str) -> Self {
        SendRequest::new(message)
    }
}

impl From<String> for SendRequest {
    fn from(message: String) -> Self {
        SendRequest::new(message)
    }
}

/// Non-fatal result of a send call
#[derive(Debug)]
pub enum SendOutcome {
    /// The model replied and, if requested, the reply parsed as JSON.
    Completed(Reply),
    /// A request or parse failure was absorbed. `reply` is the degraded value
    /// (empty text after a request failure, raw text after a parse failure).
    Recovered { reply: Reply, cause: Error },
}

impl SendOutcome {
    pub fn reply(&self) -> &Reply {
        match self {
            SendOutcome::Completed(reply) => reply,
            SendOutcome::Recovered { reply, .. } => reply,
        }
    }

    pub fn into_reply(self) -> Reply {
        match self {
            SendOutcome::Completed(reply) => reply,
            SendOutcome::Recovered { reply, .. } => reply,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, SendOutcome::Recovered { .. })
    }

    pub fn cause(&self) -> Option<&Error> {
        match self {
            SendOutcome::Completed(_) => None,
            SendOutcome::Recovered { cause, .. } => Some(cause),
        }
    }
}

/// Stateful conversation with one model
pub struct Dialog {
    model_name: String,
    sampling: SamplingParams,
    context: Context,
    client: Arc<dyn BlockingCompletionClient>,
    async_client: Arc<dyn CompletionClient>,
    encoder: Box<dyn TokenEncoder>,
}

impl std::fmt::Debug for Dialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("model_name", &self.model_name)
            .field("provider", &self.async_client.provider())
            .field("sampling", &self.sampling)
            .field("messages", &self.context.len())
            .finish()
    }
}

impl Dialog {
    /// Create a new builder for Dialog
    pub fn builder() -> DialogBuilder {
        DialogBuilder::default()
    }

    /// Dialog over HTTP with explicit provider wiring.
    pub fn new(
        model_name: impl Into<String>,
        system_prompt: impl Into<String>,
        config: ProviderConfig,
    ) -> Result<Self> {
        Self::builder()
            .model(model_name)
            .system_prompt(system_prompt)
            .provider_config(config)
            .build()
    }

    /// Dialog over HTTP for a provider, reading its key from the environment.
    pub fn from_provider(
        provider: Provider,
        model_name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Result<Self> {
        Self::new(model_name, system_prompt, ProviderConfig::from_env(provider))
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Provider tag of the configured client
    pub fn provider(&self) -> &str {
        self.async_client.provider()
    }

    pub fn sampling(&self) -> SamplingParams {
        self.sampling
    }

    pub fn set_top_p(&mut self, top_p: f32) {
        self.sampling.top_p = top_p;
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.sampling.temperature = temperature;
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Approximate token usage of the current history for this dialog's model.
    pub fn token_count(&self) -> usize {
        self.context
            .estimate_tokens(self.encoder.as_ref(), &self.model_name)
    }

    /// `true` if the estimated usage exceeds `limit * margin`.
    pub fn is_approaching_limit(&self, limit: usize, margin: f32) -> bool {
        let threshold = (limit as f32 * margin) as usize;
        self.token_count() > threshold
    }

    /// Send a turn and await the reply.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the image turn cannot be built
    /// - [`Error::MissingCredential`] if the client has no API key. The user turn
    ///   has already been appended to history when this is returned.
    ///
    /// Request and parse failures are not errors; see [`SendOutcome::Recovered`].
    pub async fn send(&mut self, request: impl Into<SendRequest>) -> Result<SendOutcome> {
        let request = request.into();
        let messages = self.prepare(&request)?;
        self.check_credential(
            self.async_client.has_credential(),
            self.async_client.provider(),
        )?;

        let result = self
            .async_client
            .complete(&messages, &self.model_name, self.sampling)
            .await;

        Ok(self.finish(result, request.format_output))
    }

    /// Blocking twin of [`Dialog::send`]; same history and failure semantics.
    ///
    /// Must not be called from inside an async runtime.
    pub fn send_blocking(&mut self, request: impl Into<SendRequest>) -> Result<SendOutcome> {
        let request = request.into();
        let messages = self.prepare(&request)?;
        self.check_credential(self.client.has_credential(), self.client.provider())?;

        let result = self
            .client
            .complete(&messages, &self.model_name, self.sampling);

        Ok(self.finish(result, request.format_output))
    }

    /// Append the user turn(s) and snapshot the request list.
    fn prepare(&mut self, request: &SendRequest) -> Result<Vec<Message>> {
        let images = non_empty(&request.images);
        let image_urls = non_empty(&request.image_urls);

        if images.is_some() || image_urls.is_some() {
            self.context
                .add_image_message(request.message.clone(), images, image_urls)?;
        } else if !request.message.is_empty() {
            self.context.add_user_message(request.message.clone());
        }

        if request.format_output {
            self.context.add_user_message(JSON_FORMAT_INSTRUCTION);
        }

        Ok(self.context.to_request_messages())
    }

    fn check_credential(&self, has_credential: bool, provider: &str) -> Result<()> {
        if has_credential {
            Ok(())
        } else {
            Err(Error::missing_credential(provider, &self.model_name))
        }
    }

    /// Record the assistant turn and classify the outcome.
    fn finish(&mut self, result: Result<String>, format_output: bool) -> SendOutcome {
        let (text, mut cause) = match result {
            Ok(text) => (text, None),
            Err(err) => {
                log::warn!(
                    "Failed to get model reply from {} (model: {}): {}",
                    self.async_client.provider(),
                    self.model_name,
                    err
                );
                (String::new(), Some(err))
            }
        };

        let reply = if format_output {
            match try_extract_json(&text, DEFAULT_EXTRACTORS) {
                Ok(value) => Reply::Json(value),
                Err(err) => {
                    log::warn!("Reply is not valid JSON, returning raw text: {}", err);
                    if cause.is_none() {
                        cause = Some(Error::Json(err));
                    }
                    Reply::Text(text)
                }
            }
        } else {
            Reply::Text(text)
        };

        self.context.add_assistant_message(reply.to_string());

        match cause {
            None => SendOutcome::Completed(reply),
            Some(cause) => SendOutcome::Recovered { reply, cause },
        }
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&[String]> {
    list.as_deref().filter(|items| !items.is_empty())
}

/// Builder for Dialog
#[derive(Default)]
pub struct DialogBuilder {
    model: Option<String>,
    system_prompt: Option<String>,
    provider_config: Option<ProviderConfig>,
    clients: Option<(Arc<dyn BlockingCompletionClient>, Arc<dyn CompletionClient>)>,
    top_p: Option<f32>,
    temperature: Option<f32>,
    encoder: Option<Box<dyn TokenEncoder>>,
}

impl std::fmt::Debug for DialogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogBuilder")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("provider_config", &self.provider_config)
            .field("custom_clients", &self.clients.is_some())
            .finish()
    }
}

impl DialogBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Talk HTTP to the endpoint described by `config`.
    pub fn provider_config(mut self, config: ProviderConfig) -> Self {
        self.provider_config = Some(config);
        self
    }

    /// Use one client implementing both flavours. Takes precedence over
    /// `provider_config`.
    pub fn client<C>(self, client: Arc<C>) -> Self
    where
        C: CompletionClient + BlockingCompletionClient + 'static,
    {
        let blocking: Arc<dyn BlockingCompletionClient> = client.clone();
        let non_blocking: Arc<dyn CompletionClient> = client;
        self.clients(blocking, non_blocking)
    }

    /// Use separate blocking and async clients.
    pub fn clients(
        mut self,
        client: Arc<dyn BlockingCompletionClient>,
        async_client: Arc<dyn CompletionClient>,
    ) -> Self {
        self.clients = Some((client, async_client));
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn token_encoder(mut self, encoder: impl TokenEncoder + 'static) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    pub fn build(self) -> Result<Dialog> {
        let model_name = self
            .model
            .ok_or_else(|| Error::config("model is required"))?;

        let (client, async_client) = match (self.clients, self.provider_config) {
            (Some(clients), _) => clients,
            (None, Some(config)) => {
                let http = Arc::new(HttpCompletionClient::new(config)?);
                let blocking: Arc<dyn BlockingCompletionClient> = http.clone();
                let non_blocking: Arc<dyn CompletionClient> = http;
                (blocking, non_blocking)
            }
            (None, None) => {
                return Err(Error::config(
                    "either provider_config or a completion client is required",
                ));
            }
        };

        let defaults = SamplingParams::default();

        Ok(Dialog {
            model_name,
            sampling: SamplingParams {
                top_p: self.top_p.unwrap_or(defaults.top_p),
                temperature: self.temperature.unwrap_or(defaults.temperature),
            },
            context: Context::new(self.system_prompt.unwrap_or_default()),
            client,
            async_client,
            encoder: self
                .encoder
                .unwrap_or_else(|| Box::new(HeuristicEncoder::default())),
        })
    }
}
