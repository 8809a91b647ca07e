//! Service Kit - Agent Tools
//!
//! Domain tools that implement `etl_core::Tool` for the Encounter transform.

mod fhir_validate;
mod uuid_gen;

pub use fhir_validate::FhirValidateTool;
pub use uuid_gen::UuidTool;
