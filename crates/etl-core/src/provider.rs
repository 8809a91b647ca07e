//! LLM Provider Strategy Pattern
//!
//! Defines the one capability the agent loop needs from a model backend:
//! given the whole conversation and the tool set, return exactly one
//! assistant message.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use etl_core::provider::{CompletionRequest, LlmProvider, ResponseFormat};
//!
//! let request = CompletionRequest {
//!     messages: conversation.messages(),
//!     tools: &registry.descriptors(),
//!     response_format: ResponseFormat::JsonObject,
//!     options: &options,
//! };
//! let completion = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolDescriptor;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o")
    pub model: String,

    /// Sampling temperature; provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate; provider default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Output format constraint passed to the provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// The model must answer with a single JSON object
    #[default]
    JsonObject,
}

/// Everything sent to the model for one round
#[derive(Clone, Copy, Debug)]
pub struct CompletionRequest<'a> {
    /// Full conversation, oldest first
    pub messages: &'a [Message],

    /// Tools the model may call
    pub tools: &'a [ToolDescriptor],

    /// Output constraint
    pub response_format: ResponseFormat,

    /// Generation options
    pub options: &'a GenerationOptions,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The assistant message (content and/or tool calls)
    pub message: Message,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map a provider's finish reason string
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Generate exactly one assistant message for the given request
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion>;
}
