//! AI provider abstractions and implementations.
//!
//! This module describes the content a generation call carries and a
//! trait-based abstraction over the backend, so handlers can run against
//! Gemini or a mock without knowing which.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Error type for provider operations.
///
/// The `Display` text is what callers see in the `message` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Api { .. } => "api",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Network(_) => "network",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<ProviderError> for service_core::error::AppError {
    fn from(err: ProviderError) -> Self {
        service_core::error::AppError::Upstream(err.to_string())
    }
}

/// Conversational role attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// Base64 payload tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// One unit of input to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// A role-tagged list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

/// Everything sent to the backend for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// A bare prompt string.
    Prompt(String),
    /// Explicit role-tagged messages.
    Messages(Vec<Message>),
}

impl Contents {
    /// Wire form: a bare prompt becomes a single user message with one text part.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Contents::Prompt(prompt) => vec![Message::user(vec![Part::text(prompt)])],
            Contents::Messages(messages) => messages,
        }
    }

    /// Total number of parts, for logging.
    pub fn part_count(&self) -> usize {
        match self {
            Contents::Prompt(_) => 1,
            Contents::Messages(messages) => messages.iter().map(|m| m.parts.len()).sum(),
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other => "other",
        }
    }
}

/// Result of a provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// Generated text; `None` when the backend returned no text parts.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Trait for content generation backends (e.g., Gemini).
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Name used in metric labels.
    fn name(&self) -> &'static str;

    /// Issue exactly one generation call.
    async fn generate(
        &self,
        model: &str,
        contents: &Contents,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
