//! Conformance Validation
//!
//! Abstractions and implementations for a FHIR `$validate` service.

mod inferno;
mod mock;

pub use inferno::{DEFAULT_BASE_URL, InfernoValidator};
pub use mock::MockValidator;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Validator client trait (Strategy pattern)
///
/// The verdict is returned as the service produced it, usually an
/// `OperationOutcome`; callers never interpret it.
#[async_trait]
pub trait ConformanceValidator: Send + Sync {
    /// Validate a resource against the profile with the given canonical URL
    async fn validate(&self, resource: &Value, profile: &str) -> Result<Value>;

    /// Validator name
    fn name(&self) -> &str;
}
