//! Target Profile
//!
//! The US Core Encounter StructureDefinition the model is asked to conform
//! to. A copy ships with the crate; a different one can be loaded from disk.

use std::path::Path;

use serde_json::Value;

use crate::error::{FhirError, Result};

/// Canonical URL of the US Core Encounter profile
pub const US_CORE_ENCOUNTER: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-encounter";

const BUNDLED: &str = include_str!("../assets/StructureDefinition-us-core-encounter.json");

/// A parsed StructureDefinition
#[derive(Clone, Debug)]
pub struct StructureDefinition {
    url: String,
    resource_type: String,
    document: Value,
}

impl StructureDefinition {
    /// The copy bundled with this crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    /// Load from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let definition = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), url = %definition.url, "Loaded structure definition");
        Ok(definition)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;

        if document.get("resourceType").and_then(Value::as_str) != Some("StructureDefinition") {
            return Err(FhirError::StructureDefinition(
                "resourceType must be StructureDefinition".into(),
            ));
        }

        let url = document
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| FhirError::StructureDefinition("missing canonical url".into()))?
            .to_string();

        let resource_type = document
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FhirError::StructureDefinition("missing constrained type".into()))?
            .to_string();

        Ok(Self {
            url,
            resource_type,
            document,
        })
    }

    /// Canonical URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resource type the profile constrains, e.g. `Encounter`
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub const fn document(&self) -> &Value {
        &self.document
    }

    /// Compact JSON text, as embedded in the prompt
    pub fn to_compact_json(&self) -> String {
        self.document.to_string()
    }

    /// Top-level elements with a minimum cardinality of at least one
    pub fn required_elements(&self) -> Vec<String> {
        let prefix = format!("{}.", self.resource_type);
        let elements = self
            .document
            .pointer("/differential/element")
            .or_else(|| self.document.pointer("/snapshot/element"))
            .and_then(Value::as_array);

        elements
            .into_iter()
            .flatten()
            .filter(|e| e.get("min").and_then(Value::as_u64).unwrap_or(0) >= 1)
            .filter_map(|e| e.get("path").and_then(Value::as_str))
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|element| !element.contains('.'))
            .map(str::to_string)
            .collect()
    }
}
