//! # modelhub
//!
//! Conversation state and request orchestration for OpenAI-compatible chat
//! completion APIs.
//!
//! ## Overview
//!
//! modelhub keeps an ordered conversation history, sends it to a chat completion
//! endpoint (blocking or async), records the reply, and can recover JSON from
//! free-form model output. Any provider speaking the OpenAI chat protocol works;
//! shortcuts exist for:
//! - OpenAI
//! - OpenRouter
//! - Volcengine Ark
//! - DMX API (cn and global)
//!
//! ## Key Features
//!
//! - **Anchored History**: One system message, always first, survives resets
//! - **Image Turns**: Base64 blobs or URLs mixed with text in one user turn
//! - **Blocking and Async**: `send_blocking()` and `send().await` share one pipeline
//! - **Graceful Degradation**: Network and model failures never abort a session
//! - **Structured Output**: Best-effort JSON extraction from fenced or inline replies
//! - **Token Estimation**: Model-aware approximate counts for budgeting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelhub::{Dialog, Provider, SendRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key is read from OPENAI_API_KEY
//!     let mut dialog = Dialog::from_provider(Provider::OpenAI, "gpt-4o", "You are a helpful assistant")?;
//!
//!     let outcome = dialog.send("What's the capital of France?").await?;
//!     println!("{}", outcome.reply());
//!
//!     // Second turn - the dialog remembers previous context
//!     let outcome = dialog
//!         .send(SendRequest::new("Give its population as JSON").format_output(true))
//!         .await?;
//!     println!("{}", outcome.reply());
//!
//!     println!("~{} tokens used", dialog.token_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **types**: Messages, content parts, sampling parameters, wire formats
//! - **context**: The conversation history container
//! - **dialog**: The request/response cycle and its failure policy
//! - **client**: Completion client traits and the HTTP implementation
//! - **config**: Provider table and credential/endpoint wiring
//! - **extract**: JSON recovery from model text
//! - **tokens**: Token estimation
//! - **error**: Error type and `Result` alias

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

/// Completion client traits (async and blocking) and the OpenAI-compatible HTTP client.
mod client;

/// Provider table mapping each provider to its credential variable and endpoint.
mod config;

/// Conversation history anchored by a fixed system message.
mod context;

/// Request cycle: append turns, dispatch, recover failures, record the reply.
mod dialog;

/// Error types and conversions.
mod error;

/// Candidate-extractor chain recovering JSON values from reply text.
mod extract;

/// Token estimation for context budgeting.
mod tokens;

/// Core type definitions for messages, content parts, and request payloads.
mod types;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

// --- Completion Clients ---

pub use client::{BlockingCompletionClient, CompletionClient, HttpCompletionClient};

// --- Provider Configuration ---

pub use config::{BASE_URL_ENV, DEFAULT_TIMEOUT, Provider, ProviderConfig, get_base_url};

// --- Conversation ---

pub use context::Context;
pub use dialog::{Dialog, DialogBuilder, JSON_FORMAT_INSTRUCTION, SendOutcome, SendRequest};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Structured Output ---

pub use extract::{
    CandidateExtractor, DEFAULT_EXTRACTORS, Reply, bracket_span, extract_json,
    extract_json_with, fenced_json_block, try_extract_json, whole_text,
};

// --- Token Estimation ---

pub use tokens::{Encoding, HeuristicEncoder, IMAGE_TOKEN_COST, TokenEncoder};

// --- Core Types ---

pub use types::{Content, ContentPart, ImageDetail, ImageUrl, Message, MessageRole, SamplingParams};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Most commonly used types. Import with `use modelhub::prelude::*;`.
pub mod prelude {
    pub use crate::{
        Context, Dialog, Error, Message, MessageRole, Provider, ProviderConfig, Reply, Result,
        SendOutcome, SendRequest,
    };
}
