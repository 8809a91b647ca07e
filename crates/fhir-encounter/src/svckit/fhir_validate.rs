//! FHIR Validate Tool
//!
//! Sends a candidate resource to the conformance validator and hands the
//! verdict back to the model untouched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use etl_core::{
    Result as CoreResult, Tool, ToolCall, ToolDescriptor, ToolResult, tool::ParameterSchema,
};

use crate::error::FhirError;
use crate::toolset::EtlTool;
use crate::validator::ConformanceValidator;

/// Tool for validating resources against the run's profile
pub struct FhirValidateTool {
    validator: Arc<dyn ConformanceValidator>,
    profile: String,
}

impl FhirValidateTool {
    pub fn new(validator: Arc<dyn ConformanceValidator>, profile: impl Into<String>) -> Self {
        Self {
            validator,
            profile: profile.into(),
        }
    }

    /// The resource to validate.
    ///
    /// Normally wrapped as `{"resource": {...}}`; a bare resource object is
    /// accepted as well.
    fn resource(arguments: &Value) -> Result<&Value, FhirError> {
        if let Some(resource) = arguments.get("resource") {
            return if resource.is_object() {
                Ok(resource)
            } else {
                Err(FhirError::InvalidResource(
                    "'resource' must be a JSON object".into(),
                ))
            };
        }

        if arguments.get("resourceType").is_some_and(Value::is_string) {
            return Ok(arguments);
        }

        Err(FhirError::InvalidResource(
            "expected a 'resource' object holding a FHIR resource".into(),
        ))
    }
}

#[async_trait]
impl Tool for FhirValidateTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: EtlTool::FhirValidate.name().into(),
            description: "Validates a FHIR Encounter Resource against US Core".into(),
            parameters: vec![ParameterSchema::required(
                "resource",
                "object",
                "The FHIR Encounter resource to validate",
            )],
        }
    }

    fn validate(&self, call: &ToolCall) -> CoreResult<()> {
        Self::resource(&call.arguments)?;
        Ok(())
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let resource = Self::resource(&call.arguments)?;

        let verdict = self.validator.validate(resource, &self.profile).await?;

        tracing::info!(
            validator = self.validator.name(),
            issues = verdict.get("issue").and_then(serde_json::Value::as_array).map_or(0, Vec::len),
            "Validation finished"
        );

        Ok(ToolResult::success(EtlTool::FhirValidate.name(), verdict.to_string()))
    }
}
