//! # fhir-encounter
//!
//! Turns a free-text clinical encounter note into a US Core Encounter
//! resource by driving an `etl-core` agent with two tools.
//!
//! ## Tools
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  fhir-validate   POST {validator}/validate?profile=<url>     │
//! │                  → OperationOutcome, passed back verbatim    │
//! │  uuidv4          → fresh UUID v4 for ids and references      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is advisory: the model reads the verdict and decides what to
//! do with it. Nothing here gates the final answer on it.

pub mod error;
pub mod profile;
pub mod prompt;
pub mod svckit;
pub mod toolset;
pub mod validator;

pub use error::{FhirError, Result};
pub use profile::{StructureDefinition, US_CORE_ENCOUNTER};
pub use prompt::{SYSTEM_PROMPT, build_user_prompt, initial_conversation};
pub use toolset::{EtlTool, registry};
pub use validator::{ConformanceValidator, InfernoValidator, MockValidator};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{FhirValidateTool, UuidTool};
}
