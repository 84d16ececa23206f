//! Structured output recovery from free-form model text
//!
//! Models asked for JSON often wrap it in a markdown fence or surround it with
//! prose. [`extract_json`] walks an ordered list of candidate extractors, parses
//! the first candidate found and falls back to the untouched text when the
//! candidate is not valid JSON.
//!
//! # Examples
//!
//! ```rust
//! use modelhub::{extract_json, Reply};
//! use serde_json::json;
//!
//! let reply = extract_json("Sure! ```json\n{\"a\": 1}\n```");
//! assert_eq!(reply, Reply::Json(json!({"a": 1})));
//!
//! let reply = extract_json("no json here");
//! assert_eq!(reply, Reply::Text("no json here".to_string()));
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Reply returned to the caller of a dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Raw reply text (also the fallback when JSON extraction fails)
    Text(String),
    /// Parsed structured value
    Json(serde_json::Value),
}

impl Reply {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Reply::Text(_) => None,
            Reply::Json(value) => Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Text(text) if text.is_empty())
    }
}

/// String rendering stored in conversation history.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) | Reply::Json(serde_json::Value::String(text)) => f.write_str(text),
            Reply::Json(value) => write!(f, "{}", value),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

/// A candidate extractor: returns the slice worth parsing, or `None` on no match.
pub type CandidateExtractor = fn(&str) -> Option<&str>;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fenced JSON pattern is valid")
});

static BRACKET_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[\[{].*[\]}]").expect("bracket span pattern is valid"));

/// Inner text of the first ```` ```json ```` fenced block.
pub fn fenced_json_block(text: &str) -> Option<&str> {
    FENCED_JSON
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Greedy span from the first `[` or `{` to the last `]` or `}`.
pub fn bracket_span(text: &str) -> Option<&str> {
    BRACKET_SPAN.find(text).map(|m| m.as_str())
}

/// The whole text, unconditionally.
pub fn whole_text(text: &str) -> Option<&str> {
    Some(text)
}

/// Extractors tried in order by [`extract_json`]; the first match wins.
pub const DEFAULT_EXTRACTORS: &[CandidateExtractor] = &[fenced_json_block, bracket_span, whole_text];

/// Parse the JSON value embedded in `text`, or hand the text back unchanged.
pub fn extract_json(text: &str) -> Reply {
    extract_json_with(text, DEFAULT_EXTRACTORS)
}

/// Like [`extract_json`] with a custom extractor chain.
pub fn extract_json_with(text: &str, extractors: &[CandidateExtractor]) -> Reply {
    match try_extract_json(text, extractors) {
        Ok(value) => Reply::Json(value),
        Err(err) => {
            log::warn!("Reply is not valid JSON, returning raw text: {}", err);
            Reply::Text(text.to_string())
        }
    }
}

/// Strict variant of [`extract_json_with`]: reports the parse failure instead of
/// falling back.
pub fn try_extract_json(
    text: &str,
    extractors: &[CandidateExtractor],
) -> serde_json::Result<serde_json::Value> {
    let candidate = extractors
        .iter()
        .find_map(|extract| extract(text))
        .unwrap_or(text);
    serde_json::from_str(candidate)
}
