//! Error types for modelhub

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// Only [`Error::InvalidArgument`] and [`Error::MissingCredential`] ever reach the
/// caller of [`Dialog::send`](crate::Dialog::send). Every other variant describes a
/// failure at the network or model boundary; the dialog recovers those locally and
/// reports them through [`SendOutcome::Recovered`](crate::SendOutcome::Recovered).
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// API error from the model server (non-success status, malformed body)
    #[error("API error: {0}")]
    Api(String),

    /// Caller supplied arguments that cannot form a valid turn
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The completion client has no usable API key
    #[error("API key is not set for provider {provider} (model: {model})")]
    MissingCredential { provider: String, model: String },

    /// Timeout error
    #[error("Request timeout")]
    Timeout,

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new API error
    pub fn api(msg: impl Into<String>) -> Self {
        Error::Api(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a missing credential error for a provider/model pair
    pub fn missing_credential(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Error::MissingCredential {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Create a new other error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a timeout error
    pub fn timeout() -> Self {
        Error::Timeout
    }

    /// Whether this error must be surfaced to the caller rather than recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::MissingCredential { .. } | Error::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_config() {
        let err = Error::config("model is required");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Invalid configuration: model is required");
    }

    #[test]
    fn test_error_api() {
        let err = Error::api("500 Internal Server Error");
        assert!(matches!(err, Error::Api(_)));
        assert_eq!(err.to_string(), "API error: 500 Internal Server Error");
    }

    #[test]
    fn test_error_invalid_argument() {
        let err = Error::invalid_argument("no image source");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Invalid argument: no image source");
    }

    #[test]
    fn test_error_missing_credential_names_provider_and_model() {
        let err = Error::missing_credential("openrouter", "gpt-4o");
        let text = err.to_string();
        assert!(text.contains("openrouter"));
        assert!(text.contains("gpt-4o"));
    }

    #[test]
    fn test_error_timeout() {
        let err = Error::timeout();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(err.to_string(), "Request timeout");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_fatal_split() {
        assert!(Error::invalid_argument("x").is_fatal());
        assert!(Error::missing_credential("openai", "m").is_fatal());
        assert!(!Error::api("boom").is_fatal());
        assert!(!Error::timeout().is_fatal());
    }
}
