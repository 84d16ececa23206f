//! Conversation context: the ordered message history owned by a dialog
//!
//! A [`Context`] always starts with exactly one system message and keeps it at
//! index 0 for its whole lifetime. The message list is only reachable through
//! read-only accessors; every mutation goes through the typed append operations
//! or [`Context::clear_history`], so the system anchor cannot be removed or
//! reordered.
//!
//! # Examples
//!
//! ```rust
//! use modelhub::{Context, MessageRole};
//!
//! let mut context = Context::new("You are a helpful assistant");
//! context.add_user_message("What's 2+2?");
//! context.add_assistant_message("4");
//! assert_eq!(context.len(), 3);
//!
//! context.clear_history();
//! assert_eq!(context.len(), 1);
//! assert_eq!(context.messages()[0].role, MessageRole::System);
//! ```

use crate::tokens::{IMAGE_TOKEN_COST, TokenEncoder};
use crate::types::{Content, ContentPart, Message};
use crate::{Error, Result};

/// Ordered conversation history anchored by a fixed system message
#[derive(Debug, Clone)]
pub struct Context {
    /// Prompt captured at construction; reused by `clear_history`.
    system_prompt: String,
    messages: Vec<Message>,
}

impl Context {
    /// Create a context holding only the system message. The prompt may be empty.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            messages: vec![Message::system(system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// All messages in conversation order. Index 0 is the system message.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: the system message is always present.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> &Message {
        // The system anchor guarantees at least one element.
        &self.messages[self.messages.len() - 1]
    }

    /// Append a plain-text user turn. Empty text is appended as-is.
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append a plain-text assistant turn.
    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Append one user turn made of `text` followed by one image part per image.
    ///
    /// `images` holds base64-encoded PNG blobs, `image_urls` holds remote URLs.
    /// At least one of them must be given. When both are given only `images` is
    /// used and `image_urls` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when neither source is provided. The
    /// context is left untouched in that case.
    pub fn add_image_message(
        &mut self,
        text: impl Into<String>,
        images: Option<&[String]>,
        image_urls: Option<&[String]>,
    ) -> Result<()> {
        let image_parts: Vec<ContentPart> = match (images, image_urls) {
            (Some(blobs), _) => blobs.iter().map(|b| ContentPart::base64_image(b)).collect(),
            (None, Some(urls)) => urls.iter().map(ContentPart::image_url).collect(),
            (None, None) => {
                return Err(Error::invalid_argument(
                    "either images or image_urls must be provided",
                ));
            }
        };

        let mut parts = Vec::with_capacity(image_parts.len() + 1);
        parts.push(ContentPart::text(text));
        parts.extend(image_parts);

        self.messages.push(Message::user_with_parts(parts));
        Ok(())
    }

    /// Drop everything but the system message, rebuilt from the original prompt.
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.messages.push(Message::system(self.system_prompt.clone()));
    }

    /// Provider-neutral request list: role and content passed through unchanged.
    pub fn to_request_messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Approximate token usage of the whole history.
    ///
    /// Each message is charged for its role label plus, for plain-text content,
    /// the text itself. Multi-part content is charged [`IMAGE_TOKEN_COST`] per
    /// image part; text parts inside multi-part content are not counted.
    pub fn estimate_tokens(&self, encoder: &dyn TokenEncoder, model: &str) -> usize {
        self.messages
            .iter()
            .map(|message| {
                let role = encoder.count(model, message.role.as_str());
                let content = match &message.content {
                    Content::Text(text) => encoder.count(model, text),
                    Content::Parts(_) => message.content.image_count() * IMAGE_TOKEN_COST,
                };
                role + content
            })
            .sum()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::HeuristicEncoder;
    use crate::types::MessageRole;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_context_has_system_message() {
        let context = Context::new("Be brief");
        assert_eq!(context.len(), 1);
        assert_eq!(context.messages()[0], Message::system("Be brief"));
    }

    #[test]
    fn test_empty_system_prompt_allowed() {
        let context = Context::default();
        assert_eq!(context.messages()[0].role, MessageRole::System);
        assert_eq!(context.messages()[0].content.as_text(), Some(""));
    }

    #[test]
    fn test_user_then_assistant_adds_two_in_order() {
        let mut context = Context::new("sys");
        context.add_user_message("first");
        let before = context.to_request_messages();

        context.add_user_message("question");
        context.add_assistant_message("answer");

        assert_eq!(context.len(), before.len() + 2);
        assert_eq!(&context.messages()[..before.len()], &before[..]);
        assert_eq!(context.messages()[3], Message::assistant("answer"));
    }

    #[test]
    fn test_empty_user_text_is_appended() {
        let mut context = Context::new("sys");
        context.add_user_message("");
        assert_eq!(context.last(), &Message::user(""));
    }

    #[test]
    fn test_image_message_with_base64() {
        let mut context = Context::new("sys");
        let blobs = strings(&["AAA", "BBB"]);
        context
            .add_image_message("describe", Some(&blobs), None)
            .unwrap();

        let parts = context.last().content.parts().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ContentPart::text("describe"));
        assert_eq!(parts[1], ContentPart::base64_image("AAA"));
        assert_eq!(parts[2], ContentPart::base64_image("BBB"));
        assert_eq!(context.last().role, MessageRole::User);
    }

    #[test]
    fn test_image_message_with_urls() {
        let mut context = Context::new("sys");
        let urls = strings(&["https://example.com/a.png"]);
        context.add_image_message("look", None, Some(&urls)).unwrap();

        let parts = context.last().content.parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], ContentPart::image_url("https://example.com/a.png"));
    }

    #[test]
    fn test_image_message_prefers_base64_when_both_given() {
        let mut context = Context::new("sys");
        let blobs = strings(&["AAA"]);
        let urls = strings(&["https://example.com/a.png", "https://example.com/b.png"]);
        context
            .add_image_message("both", Some(&blobs), Some(&urls))
            .unwrap();

        let parts = context.last().content.parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], ContentPart::base64_image("AAA"));
    }

    #[test]
    fn test_image_message_without_source_fails() {
        let mut context = Context::new("sys");
        let err = context.add_image_message("nothing", None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_clear_history_reuses_original_prompt() {
        let mut context = Context::new("original");
        context.add_user_message("hi");
        context.add_assistant_message("hello");

        context.clear_history();
        assert_eq!(context.messages(), &[Message::system("original")]);
    }

    #[test]
    fn test_clear_history_idempotent() {
        let mut context = Context::new("sys");
        context.add_user_message("hi");

        context.clear_history();
        let once = context.to_request_messages();
        context.clear_history();
        assert_eq!(context.messages(), &once[..]);
    }

    #[test]
    fn test_system_anchor_survives_operations() {
        let mut context = Context::new("sys");
        let urls = strings(&["u"]);
        context.add_user_message("a");
        context.add_assistant_message("b");
        context.add_image_message("c", None, Some(&urls)).unwrap();
        assert_eq!(context.messages()[0].role, MessageRole::System);
        context.clear_history();
        assert_eq!(context.messages()[0].role, MessageRole::System);
        context.add_assistant_message("d");
        assert_eq!(context.messages()[0].role, MessageRole::System);
    }

    #[test]
    fn test_estimate_tokens_system_plus_image_turn() {
        let encoder = HeuristicEncoder::default();
        let model = "gpt-4";
        let mut context = Context::new("You are helpful");
        let urls = strings(&["https://example.com/a.png"]);
        context.add_image_message("", None, Some(&urls)).unwrap();

        let system_cost =
            encoder.count(model, "system") + encoder.count(model, "You are helpful");
        let user_role_cost = encoder.count(model, "user");

        assert_eq!(
            context.estimate_tokens(&encoder, model),
            system_cost + user_role_cost + IMAGE_TOKEN_COST
        );
    }

    #[test]
    fn test_estimate_tokens_ignores_text_parts() {
        let encoder = HeuristicEncoder::default();
        let urls = strings(&["u1", "u2"]);

        let mut with_text = Context::new("");
        with_text
            .add_image_message("a very long description of the pictures", None, Some(&urls))
            .unwrap();
        let mut without_text = Context::new("");
        without_text.add_image_message("", None, Some(&urls)).unwrap();

        assert_eq!(
            with_text.estimate_tokens(&encoder, "gpt-4o"),
            without_text.estimate_tokens(&encoder, "gpt-4o")
        );
    }
}
