//! Provider configuration for modelhub
//!
//! Every supported provider speaks the OpenAI-compatible chat completions
//! protocol, so a provider is nothing more than a row of data: where its API key
//! lives in the environment and which endpoint it answers on.

use std::env;
use std::fmt;
use std::time::Duration;

/// Environment variable that overrides any provider's base URL.
pub const BASE_URL_ENV: &str = "MODELHUB_BASE_URL";

/// Default HTTP timeout for completion requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Supported provider shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    OpenRouter,
    /// Volcengine Ark (Doubao models)
    Volc,
    /// DMX API, mainland China endpoint
    DmxCn,
    /// DMX API, international endpoint
    DmxGlobal,
    /// Any other OpenAI-compatible server; endpoint and key are supplied by hand
    Custom,
}

impl Provider {
    /// `(credential env var, default endpoint)` for each provider.
    fn row(&self) -> (&'static str, &'static str) {
        match self {
            Provider::OpenAI => ("OPENAI_API_KEY", "https://api.openai.com/v1"),
            Provider::OpenRouter => ("OPENROUTER_API_KEY", "https://openrouter.ai/api/v1"),
            Provider::Volc => ("VOLC_API_KEY", "https://ark.cn-beijing.volces.com/api/v3"),
            Provider::DmxCn => ("DMX_API_KEY", "https://www.dmxapi.cn/v1"),
            Provider::DmxGlobal => ("DMX_API_KEY", "https://www.dmxapi.com/v1"),
            Provider::Custom => ("MODELHUB_API_KEY", "http://localhost:8000/v1"),
        }
    }

    /// Environment variable holding this provider's API key
    pub fn credential_env(&self) -> &'static str {
        self.row().0
    }

    /// Get the default base URL for this provider
    pub fn default_url(&self) -> &'static str {
        self.row().1
    }

    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Volc => "volc",
            Provider::DmxCn => "dmx-cn",
            Provider::DmxGlobal => "dmx-global",
            Provider::Custom => "custom",
        }
    }

    /// Parse a provider from a string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "openrouter" | "open-router" => Some(Provider::OpenRouter),
            "volc" | "volcengine" | "ark" => Some(Provider::Volc),
            "dmx" | "dmx-cn" | "dmx_cn" => Some(Provider::DmxCn),
            "dmx-global" | "dmx_global" | "dmx-com" => Some(Provider::DmxGlobal),
            "custom" => Some(Provider::Custom),
            _ => None,
        }
    }

    /// DMX endpoint for an area code: `"cn"` selects the mainland endpoint,
    /// anything else the international one.
    pub fn dmx(area: &str) -> Self {
        if area.eq_ignore_ascii_case("cn") {
            Provider::DmxCn
        } else {
            Provider::DmxGlobal
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credential and endpoint wiring for one completion client
///
/// Built once and handed to the client; nothing mutates it afterwards.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Config with an explicit key and the provider's default endpoint.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the API key from the provider's environment variable.
    ///
    /// A missing variable yields an empty key; the dialog reports it as a
    /// missing credential when a request is attempted. The endpoint is the
    /// provider default unless `MODELHUB_BASE_URL` is set, in which case that
    /// URL is used for every provider, and the provider's key is sent to it.
    pub fn from_env(provider: Provider) -> Self {
        Self::from_lookup(provider, |name| env::var(name).ok())
    }

    /// Same resolution as [`ProviderConfig::from_env`] with a custom variable source.
    pub fn from_lookup(provider: Provider, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup(provider.credential_env()).unwrap_or_default();
        let base_url = base_url_from(&lookup, Some(provider), None);
        Self {
            base_url,
            ..Self::new(provider, api_key)
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Get the base URL from environment variable or provider default
///
/// The override is not scoped to a provider: when set it replaces the endpoint
/// of every provider.
///
/// Priority:
/// 1. MODELHUB_BASE_URL environment variable
/// 2. Provider default URL (if provider is Some)
/// 3. fallback parameter
/// 4. OpenAI's endpoint
pub fn get_base_url(provider: Option<Provider>, fallback: Option<&str>) -> String {
    base_url_from(|name| env::var(name).ok(), provider, fallback)
}

fn base_url_from(
    lookup: impl Fn(&str) -> Option<String>,
    provider: Option<Provider>,
    fallback: Option<&str>,
) -> String {
    if let Some(url) = lookup(BASE_URL_ENV) {
        return url;
    }

    if let Some(p) = provider {
        return p.default_url().to_string();
    }

    fallback
        .unwrap_or(Provider::OpenAI.default_url())
        .to_string()
}
