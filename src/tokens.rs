//! Token counting for context budgeting
//!
//! Counts produced here are approximations meant for deciding when a conversation
//! is getting long. They are not billing-accurate and never fail: an unknown model
//! name falls back to the default encoding.
//!
//! # Examples
//!
//! ```rust
//! use modelhub::{HeuristicEncoder, TokenEncoder};
//!
//! let encoder = HeuristicEncoder::default();
//! let tokens = encoder.count("gpt-4o", "Hello, world!");
//! assert!(tokens > 0);
//! ```

/// Flat charge for every image part in multi-part content.
pub const IMAGE_TOKEN_COST: usize = 85;

/// Maps text to a token count under a model-specific vocabulary.
///
/// Implementations must be infallible. Plug in a real BPE tokenizer by
/// implementing this trait and passing it to
/// [`Context::estimate_tokens`](crate::Context::estimate_tokens).
pub trait TokenEncoder: Send + Sync {
    fn count(&self, model: &str, text: &str) -> usize;
}

/// Subword vocabulary families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// gpt-4, gpt-3.5-turbo and the embedding models
    Cl100kBase,
    /// gpt-4o, gpt-4.1 and the o-series reasoning models
    O200kBase,
}

impl Encoding {
    /// Encoding used when the model is not recognized.
    pub const DEFAULT: Encoding = Encoding::Cl100kBase;

    /// Resolve the encoding for a model name, if the family is known.
    ///
    /// Provider prefixes such as `openai/` (OpenRouter style) are ignored.
    pub fn for_model(model: &str) -> Option<Self> {
        let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();

        const O200K: &[&str] = &["gpt-4o", "gpt-4.1", "gpt-4.5", "gpt-5", "o1", "o3", "o4"];
        const CL100K: &[&str] = &["gpt-4", "gpt-3.5", "text-embedding-3", "text-embedding-ada"];

        if O200K.iter().any(|prefix| name.starts_with(prefix)) {
            Some(Encoding::O200kBase)
        } else if CL100K.iter().any(|prefix| name.starts_with(prefix)) {
            Some(Encoding::Cl100kBase)
        } else {
            None
        }
    }

    /// Average number of ASCII word characters merged into one token.
    fn chars_per_token(&self) -> usize {
        match self {
            Encoding::Cl100kBase => 4,
            Encoding::O200kBase => 5,
        }
    }

    /// Approximate the subword count of `text`.
    ///
    /// Runs of ASCII letters and digits are split into chunks of
    /// `chars_per_token`; whitespace is folded into the following word; every
    /// other character (punctuation, symbols, CJK) costs one token.
    pub fn count(&self, text: &str) -> usize {
        let per_token = self.chars_per_token();
        let mut tokens = 0;
        let mut run = 0usize;

        for ch in text.chars() {
            if ch.is_ascii_alphanumeric() {
                run += 1;
                continue;
            }
            tokens += run.div_ceil(per_token);
            run = 0;
            if !ch.is_whitespace() {
                tokens += 1;
            }
        }

        tokens + run.div_ceil(per_token)
    }
}

/// Character-class heuristic encoder, selecting an [`Encoding`] by model family.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEncoder {
    fallback: Encoding,
}

impl HeuristicEncoder {
    pub fn new(fallback: Encoding) -> Self {
        Self { fallback }
    }

    pub fn encoding_for(&self, model: &str) -> Encoding {
        Encoding::for_model(model).unwrap_or(self.fallback)
    }
}

impl Default for HeuristicEncoder {
    fn default() -> Self {
        Self::new(Encoding::DEFAULT)
    }
}

impl TokenEncoder for HeuristicEncoder {
    fn count(&self, model: &str, text: &str) -> usize {
        self.encoding_for(model).count(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_for_model() {
        assert_eq!(Encoding::for_model("gpt-4o-mini"), Some(Encoding::O200kBase));
        assert_eq!(Encoding::for_model("o3-mini"), Some(Encoding::O200kBase));
        assert_eq!(Encoding::for_model("gpt-4-turbo"), Some(Encoding::Cl100kBase));
        assert_eq!(Encoding::for_model("gpt-3.5-turbo"), Some(Encoding::Cl100kBase));
        assert_eq!(
            Encoding::for_model("openai/gpt-4o"),
            Some(Encoding::O200kBase)
        );
        assert_eq!(Encoding::for_model("doubao-pro-256k-241115"), None);
    }

    #[test]
    fn test_unknown_model_uses_fallback() {
        let encoder = HeuristicEncoder::default();
        assert_eq!(encoder.encoding_for("qwen2.5-32b-instruct"), Encoding::DEFAULT);
        assert_eq!(
            encoder.count("qwen2.5-32b-instruct", "hello"),
            Encoding::DEFAULT.count("hello")
        );
    }

    #[test]
    fn test_count_empty() {
        assert_eq!(Encoding::Cl100kBase.count(""), 0);
        assert_eq!(Encoding::O200kBase.count("   "), 0);
    }

    #[test]
    fn test_count_words_and_punctuation() {
        // "Hello" -> 2, "," -> 1, "world" -> 2, "!" -> 1
        assert_eq!(Encoding::Cl100kBase.count("Hello, world!"), 6);
        // "Hello" -> 1, "," -> 1, "world" -> 1, "!" -> 1
        assert_eq!(Encoding::O200kBase.count("Hello, world!"), 4);
    }

    #[test]
    fn test_count_role_labels() {
        assert_eq!(Encoding::Cl100kBase.count("user"), 1);
        assert_eq!(Encoding::Cl100kBase.count("system"), 2);
        assert_eq!(Encoding::Cl100kBase.count("assistant"), 3);
    }

    #[test]
    fn test_count_cjk_per_character() {
        assert_eq!(Encoding::Cl100kBase.count("解答用户问题"), 6);
    }
}
