//! Chat-completions wire format
//!
//! Conversion between the agent's message model and the JSON shape used by
//! OpenAI-compatible `/v1/chat/completions` endpoints.

use serde_json::{Map, Value, json};

use etl_core::{
    AgentError, Message, Result, Role, ToolCallRequest, ToolDescriptor,
    provider::{FinishReason, ResponseFormat, TokenUsage},
};

/// Convert the conversation into the request `messages` array
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
                "content": message.text(),
            }),
            Role::Assistant if message.has_tool_calls() => {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                // sent back verbatim so the model sees what it wrote
                                "arguments": call.arguments,
                            }
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": message.content,
                    "tool_calls": tool_calls,
                })
            }
            role => json!({
                "role": role,
                "content": message.text(),
            }),
        })
        .collect()
}

/// Convert tool descriptors into the request `tools` array
pub fn tools_to_openai_spec(tools: &[ToolDescriptor]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            let mut function = Map::new();
            function.insert("name".into(), json!(tool.name));
            function.insert("description".into(), json!(tool.description));
            if let Some(parameters) = tool.parameters_schema() {
                function.insert("parameters".into(), parameters);
            }
            json!({
                "type": "function",
                "function": function,
            })
        })
        .collect()
}

/// The `response_format` request field, if any
pub fn response_format_spec(format: ResponseFormat) -> Option<Value> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::JsonObject => Some(json!({ "type": "json_object" })),
    }
}

/// Convert the first choice of a response into an assistant message
pub fn openai_response_to_message(response: &Value) -> Result<(Message, Option<FinishReason>)> {
    let choice = response
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AgentError::Provider("Response has no choices".into()))?;

    let original = choice
        .get("message")
        .ok_or_else(|| AgentError::Provider("Response choice has no message".into()))?;

    let mut tool_calls = Vec::new();
    if let Some(calls) = original.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            tool_calls.push(parse_tool_call(call)?);
        }
    }

    let message = Message {
        content: original
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
        ..Message::assistant_tool_calls(tool_calls)
    };

    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(FinishReason::from_wire);

    Ok((message, finish_reason))
}

fn parse_tool_call(call: &Value) -> Result<ToolCallRequest> {
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AgentError::Provider("Tool call without an id".into()))?;

    let function = &call["function"];
    let name = function["name"].as_str().unwrap_or_default();

    // Arguments stay raw; parsing (and failing on bad JSON) is the loop's job.
    let arguments = match &function["arguments"] {
        Value::String(raw) => raw.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    Ok(ToolCallRequest::new(id, name, arguments))
}

/// Token accounting from the `usage` block, when present
pub fn get_usage(response: &Value) -> Option<TokenUsage> {
    let usage = response.get("usage")?;
    let field = |key: &str| {
        usage
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };

    let prompt_tokens = field("prompt_tokens").unwrap_or(0);
    let completion_tokens = field("completion_tokens").unwrap_or(0);
    let total_tokens = field("total_tokens")
        .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));

    Some(TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    })
}
