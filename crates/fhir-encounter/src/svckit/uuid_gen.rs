//! UUID Tool

use async_trait::async_trait;
use uuid::Uuid;

use etl_core::{Result as CoreResult, Tool, ToolCall, ToolDescriptor, ToolResult};

use crate::toolset::EtlTool;

/// Generates a random UUID v4 per call
#[derive(Default)]
pub struct UuidTool;

impl UuidTool {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for UuidTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: EtlTool::Uuidv4.name().into(),
            description: "Generates a UUIDv4".into(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
        Ok(ToolResult::success(
            EtlTool::Uuidv4.name(),
            Uuid::new_v4().hyphenated().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call() -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "uuidv4".into(),
            arguments: json!({}),
        }
    }

    #[tokio::test]
    async fn test_distinct_canonical_uuids() {
        let tool = UuidTool::new();
        let a = tool.execute(&call()).await.unwrap().output;
        let b = tool.execute(&call()).await.unwrap().output;

        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        let parsed = Uuid::parse_str(&a).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_zero_argument_descriptor() {
        assert!(UuidTool.descriptor().parameters_schema().is_none());
    }
}
