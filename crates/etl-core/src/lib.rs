//! # etl-core
//!
//! Provider-agnostic tool-calling agent loop for single-pass ETL transforms.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Agent                               │
//! │  ┌──────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Conversation │──│  Agent loop │──│   LlmProvider       │  │
//! │  │ (append-only)│  │  (bounded)  │  │   (Strategy)        │  │
//! │  └──────────────┘  └──────┬──────┘  └─────────────────────┘  │
//! │                           │                                  │
//! │                    ┌──────┴──────┐  ┌─────────────────────┐  │
//! │                    │ ToolRegistry│  │ ResultEmitter       │  │
//! │                    └─────────────┘  │  → OutputSink       │  │
//! │                                     └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of any model vendor;
//! the `Tool` trait keeps it independent of what the tools do.

pub mod emitter;
pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod run;
pub mod tool;

pub use emitter::{MemorySink, OutputSink, ResultEmitter, parse_final_answer};
pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role, ToolCallRequest};
pub use provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, ResponseFormat};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentOutcome};
pub use run::{RunId, RunReport};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolDescriptor, ToolRegistry, ToolResult};
