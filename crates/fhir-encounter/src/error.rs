//! Error Types for the Encounter transform

use etl_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FhirError>;

#[derive(Error, Debug)]
pub enum FhirError {
    /// Tool arguments don't carry a FHIR resource
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Validator answered with something other than JSON
    #[error("Validator returned a non-JSON response ({status}): {detail}")]
    ValidatorResponse { status: u16, detail: String },

    #[error("Structure definition error: {0}")]
    StructureDefinition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FhirError> for AgentError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::InvalidResource(msg) => Self::ToolValidation(msg),
            FhirError::Config(msg) | FhirError::StructureDefinition(msg) => Self::Config(msg),
            FhirError::Io(e) => Self::Io(e),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}
