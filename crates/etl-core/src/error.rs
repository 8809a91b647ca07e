//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments parsed but have the wrong shape
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Tool call arguments are not valid JSON
    #[error("Malformed arguments for tool '{tool}' (call {id}): {source}")]
    MalformedArguments {
        id: String,
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    /// Round budget exhausted before the model produced a final answer
    #[error("Maximum rounds ({0}) reached without a final answer")]
    MaxRounds(usize),

    /// A network call exceeded its deadline
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Final answer is not a JSON object
    #[error("Final answer is not a JSON object: {0}")]
    FinalAnswer(String),

    /// Model stopped without tool calls and without content
    #[error("Model returned neither content nor tool calls")]
    EmptyAnswer,

    /// Append would break conversation ordering/correlation rules
    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Timeout { .. } | Self::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The model service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The model service is currently unavailable. Please try again.".into()
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::MalformedArguments { tool, .. } => {
                format!("The model sent unreadable arguments to '{tool}'.")
            }
            Self::MaxRounds(n) => {
                format!("The model did not settle on an answer within {n} rounds.")
            }
            Self::Timeout { operation, .. } => format!("{operation} took too long."),
            Self::FinalAnswer(_) | Self::EmptyAnswer => {
                "The model did not return a usable JSON resource.".into()
            }
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
