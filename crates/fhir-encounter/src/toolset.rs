//! Tool Set
//!
//! The closed set of tools the Encounter transform exposes to the model.

use std::sync::Arc;

use etl_core::{Result, Tool, ToolRegistry};

use crate::svckit::{FhirValidateTool, UuidTool};
use crate::validator::ConformanceValidator;

/// Identity of every tool this transform offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EtlTool {
    FhirValidate,
    Uuidv4,
}

impl EtlTool {
    pub const ALL: [Self; 2] = [Self::FhirValidate, Self::Uuidv4];

    /// Wire name shown to the model
    pub const fn name(self) -> &'static str {
        match self {
            Self::FhirValidate => "fhir-validate",
            Self::Uuidv4 => "uuidv4",
        }
    }
}

impl std::fmt::Display for EtlTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the registry holding every [`EtlTool`]
pub fn registry(validator: Arc<dyn ConformanceValidator>, profile: &str) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in EtlTool::ALL {
        let handler: Arc<dyn Tool> = match tool {
            EtlTool::FhirValidate => Arc::new(FhirValidateTool::new(validator.clone(), profile)),
            EtlTool::Uuidv4 => Arc::new(UuidTool::new()),
        };
        registry.register_arc(handler)?;
    }
    Ok(registry)
}
