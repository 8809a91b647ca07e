//! Mock Validator
//!
//! For testing and offline runs. Checks only the top-level required elements
//! of a structure definition and answers with an `OperationOutcome`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::ConformanceValidator;
use crate::error::Result;
use crate::profile::StructureDefinition;

pub struct MockValidator {
    resource_type: String,
    required: Vec<String>,
    calls: AtomicUsize,
}

impl MockValidator {
    pub fn new(profile: &StructureDefinition) -> Self {
        Self {
            resource_type: profile.resource_type().to_string(),
            required: profile.required_elements(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of validations performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn issue(severity: &str, code: &str, expression: &str, diagnostics: String) -> Value {
        json!({
            "severity": severity,
            "code": code,
            "diagnostics": diagnostics,
            "expression": [expression],
        })
    }
}

#[async_trait]
impl ConformanceValidator for MockValidator {
    async fn validate(&self, resource: &Value, profile: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut issues = Vec::new();

        let actual = resource.get("resourceType").and_then(Value::as_str).unwrap_or("");
        if actual != self.resource_type {
            issues.push(Self::issue(
                "error",
                "structure",
                "resourceType",
                format!("Expected a {} resource, found '{actual}'", self.resource_type),
            ));
        }

        for element in &self.required {
            let present = resource
                .get(element)
                .is_some_and(|v| !v.is_null() && v.as_array().is_none_or(|a| !a.is_empty()));
            if !present {
                let path = format!("{}.{element}", self.resource_type);
                issues.push(Self::issue(
                    "error",
                    "required",
                    &path,
                    format!("{path}: minimum required = 1, but only found 0 (from {profile})"),
                ));
            }
        }

        if issues.is_empty() {
            issues.push(json!({
                "severity": "information",
                "code": "informational",
                "diagnostics": "All OK",
            }));
        }

        Ok(json!({
            "resourceType": "OperationOutcome",
            "issue": issues,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
