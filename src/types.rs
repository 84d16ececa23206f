//! Core types for modelhub

use serde::{Deserialize, Serialize};

/// Message role in the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire label of the role, as sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Image detail hint forwarded to vision models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    Auto,
}

/// Image reference inside a content part
///
/// Base64 images travel as `data:` URLs, so both sources share this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// One element of multi-part content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Image part for a base64-encoded PNG blob, sent with a `low` detail hint.
    pub fn base64_image(blob: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/png;base64,{}", blob),
                detail: Some(ImageDetail::Low),
            },
        }
    }

    /// Image part referencing a remote URL. No detail hint is attached.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentPart::ImageUrl { .. })
    }
}

/// Message content: plain text or an ordered sequence of parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// The plain text, if this is single-string content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Parts(_) => None,
        }
    }

    pub fn parts(&self) -> Option<&[ContentPart]> {
        match self {
            Content::Text(_) => None,
            Content::Parts(parts) => Some(parts),
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts()
            .map(|parts| parts.iter().filter(|p| p.is_image()).count())
            .unwrap_or(0)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

/// A message in the conversation
///
/// Serializes directly to the OpenAI chat message shape, which is the neutral
/// request format handed to every completion client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: Content,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, Content::Text(text.into()))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, Content::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, Content::Text(text.into()))
    }

    /// Create a user message with custom content parts
    pub fn user_with_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(MessageRole::User, Content::Parts(parts))
    }
}

/// Sampling parameters forwarded with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub top_p: f32,
    pub temperature: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_p: 1.0,
            temperature: 0.3,
        }
    }
}

/// OpenAI-compatible chat completion request (non-streaming)
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub top_p: f32,
    pub temperature: f32,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice. A `null` content is read as an empty reply.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
    }
}
