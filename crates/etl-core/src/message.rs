//! Conversation Messages
//!
//! Standard message format used across the agent system. A [`Conversation`]
//! is append-only: once a message is pushed it is never edited, removed or
//! reordered, and every round of inference sees all of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tool::ToolCall;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the assistant, arguments still unparsed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier, unique within one assistant response
    pub id: String,

    /// Requested tool name
    pub name: String,

    /// Raw JSON text exactly as the model produced it
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw arguments into a [`ToolCall`].
    ///
    /// Blank arguments are read as `{}` since zero-argument tools are
    /// routinely called with an empty string. Anything else must be valid JSON.
    pub fn parse(&self) -> Result<ToolCall> {
        let raw = self.arguments.trim();
        let arguments = if raw.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw).map_err(|source| AgentError::MalformedArguments {
                id: self.id.clone(),
                tool: self.name.clone(),
                source,
            })?
        };

        Ok(ToolCall {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments,
        })
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content; `None` on assistant turns that only request tools
    pub content: Option<String>,

    /// Tool calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Correlates a tool turn with the request that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant turn that only requests tools
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool result message
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Whether this assistant turn asks for tools
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Content as `&str`, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Estimate token count (rough approximation)
    pub fn estimate_tokens(&self) -> u32 {
        let chars = self.text().len()
            + self
                .tool_calls
                .iter()
                .map(|c| c.name.len() + c.arguments.len())
                .sum::<usize>();
        // ~4 characters per token, +4 for role overhead
        u32::try_from(chars / 4).unwrap_or(u32::MAX).saturating_add(4)
    }
}

/// Append-only conversation history; built only through [`Conversation::push`]
#[derive(Clone, Debug, Default, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Append a message.
    ///
    /// Tool messages must answer an outstanding request of the most recent
    /// assistant turn, each request at most once.
    pub fn push(&mut self, message: Message) -> Result<()> {
        if message.role == Role::Tool {
            let id = message.tool_call_id.as_deref().ok_or_else(|| {
                AgentError::Conversation("tool message without tool_call_id".into())
            })?;
            if !self.outstanding_tool_calls().iter().any(|r| r.id == id) {
                return Err(AgentError::Conversation(format!(
                    "tool message '{id}' does not answer an outstanding tool call"
                )));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Tool calls of the latest assistant turn that have no reply yet, in
    /// request order
    pub fn outstanding_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let Some(pos) = self.messages.iter().rposition(|m| m.role != Role::Tool) else {
            return Vec::new();
        };
        let turn = &self.messages[pos];
        if turn.role != Role::Assistant {
            return Vec::new();
        }

        let answered: Vec<&str> = self.messages[pos + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        turn.tool_calls
            .iter()
            .filter(|r| !answered.contains(&r.id.as_str()))
            .collect()
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Estimate total tokens in conversation
    pub fn estimate_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimate_tokens).sum()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_call_turn() -> Message {
        Message::assistant_tool_calls(vec![
            ToolCallRequest::new("call_a", "uuidv4", ""),
            ToolCallRequest::new("call_b", "uuidv4", "{}"),
        ])
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_conversation() {
        let mut conv = Conversation::with_system_prompt("You are helpful.");
        conv.push(Message::user("Hi")).unwrap();
        conv.push(Message::assistant("Hello!")).unwrap();

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_tool_replies_must_correlate() {
        let mut conv = Conversation::with_system_prompt("sys");
        conv.push(Message::user("note")).unwrap();
        conv.push(two_call_turn()).unwrap();

        assert_eq!(conv.outstanding_tool_calls().len(), 2);
        conv.push(Message::tool("x", "call_a")).unwrap();
        assert_eq!(conv.outstanding_tool_calls()[0].id, "call_b");

        // answering the same call twice is rejected
        assert!(matches!(
            conv.push(Message::tool("y", "call_a")),
            Err(AgentError::Conversation(_))
        ));
        // as is an id from nowhere
        assert!(conv.push(Message::tool("y", "call_zzz")).is_err());

        conv.push(Message::tool("y", "call_b")).unwrap();
        assert!(conv.outstanding_tool_calls().is_empty());
        assert_eq!(conv.len(), 5);
    }

    #[test]
    fn test_tool_reply_without_assistant_turn_rejected() {
        let mut conv = Conversation::with_system_prompt("sys");
        conv.push(Message::user("note")).unwrap();
        assert!(conv.push(Message::tool("x", "call_a")).is_err());

        let mut orphan = Message::tool("x", "call_a");
        orphan.tool_call_id = None;
        assert!(conv.push(orphan).is_err());
    }

    #[test]
    fn test_parse_blank_arguments_as_empty_object() {
        let call = ToolCallRequest::new("1", "uuidv4", "  ").parse().unwrap();
        assert_eq!(call.arguments, serde_json::json!({}));
    }

    #[test]
    fn test_parse_truncated_arguments_fails() {
        let request = ToolCallRequest::new("1", "fhir-validate", r#"{"resource": {"resourceType": "Enc"#);
        match request.parse() {
            Err(AgentError::MalformedArguments { id, tool, .. }) => {
                assert_eq!(id, "1");
                assert_eq!(tool, "fhir-validate");
            }
            other => panic!("expected MalformedArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_serialization_skips_empty_tool_fields() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
        assert_eq!(json["role"], "user");
    }
}
