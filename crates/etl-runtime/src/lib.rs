//! # etl-runtime
//!
//! Model providers for the ETL agent loop.
//!
//! ## Providers
//!
//! - **OpenAI** (default): chat-completions API with tool calling and JSON mode
//!
//! ## Usage
//!
//! ```rust,ignore
//! use etl_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod format;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use etl_core::{Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry};
