//! OpenAI LLM Provider
//!
//! Implementation of `LlmProvider` for the OpenAI chat-completions API and
//! compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use etl_core::{
    AgentError, Result,
    provider::{Completion, CompletionRequest, LlmProvider},
};

use crate::format::{
    get_usage, messages_to_openai_spec, openai_response_to_message, response_format_spec,
    tools_to_openai_spec,
};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base URL
    pub host: String,

    /// Bearer token
    pub api_key: String,

    /// Sent as `OpenAI-Organization` when set
    pub organization: Option<String>,

    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            host: "https://api.openai.com".into(),
            api_key: String::new(),
            organization: None,
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    /// Read `OPENAI_API_KEY`, `OPENAI_ORG` and `OPENAI_HOST`.
    ///
    /// Missing or empty credentials are a configuration error, reported
    /// before any network activity.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("OPENAI_API_KEY is not set".into()))?;

        let organization = std::env::var("OPENAI_ORG")
            .ok()
            .filter(|o| !o.trim().is_empty());

        let host = std::env::var("OPENAI_HOST").unwrap_or_else(|_| Self::default().host);

        Ok(Self {
            host,
            api_key,
            organization,
            ..Default::default()
        })
    }
}

/// OpenAI LLM provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::Config("OpenAI API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_payload(request: &CompletionRequest<'_>) -> Value {
        let mut payload = json!({
            "model": request.options.model,
            "messages": messages_to_openai_spec(request.messages),
        });

        if !request.tools.is_empty() {
            payload["tools"] = json!(tools_to_openai_spec(request.tools));
        }
        if let Some(format) = response_format_spec(request.response_format) {
            payload["response_format"] = format;
        }
        if let Some(temp) = request.options.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = request.options.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        payload
    }

    async fn post(&self, payload: &Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(payload);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            return response
                .json()
                .await
                .map_err(|e| AgentError::Provider(format!("Unreadable response body: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(body),
            s if s.is_server_error() => AgentError::ProviderUnavailable(format!("{s}: {body}")),
            s => AgentError::Provider(format!("Request failed: {s}: {body}")),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let payload = Self::build_payload(&request);
        tracing::debug!(
            model = %request.options.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion request"
        );

        let response = self.post(&payload).await?;

        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let detail = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(AgentError::Provider(format!("OpenAI API error: {detail}")));
        }

        let (message, finish_reason) = openai_response_to_message(&response)?;
        let model = response
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(&request.options.model)
            .to_string();

        Ok(Completion {
            message,
            model,
            usage: get_usage(&response),
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etl_core::{
        GenerationOptions, Message, ParameterSchema, ResponseFormat, Role, ToolCallRequest,
        ToolDescriptor, provider::FinishReason,
    };
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(status: u16, body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(&mock_server)).unwrap();
        (mock_server, provider)
    }

    fn test_config(server: &MockServer) -> OpenAiConfig {
        OpenAiConfig {
            host: server.uri(),
            api_key: "test_api_key".into(),
            organization: Some("org-test".into()),
            timeout_secs: 5,
        }
    }

    fn tools() -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "fhir-validate".into(),
            description: "Validates a FHIR Encounter resource".into(),
            parameters: vec![ParameterSchema::required(
                "resource",
                "object",
                "The FHIR Encounter resource to validate",
            )],
        }]
    }

    async fn complete(provider: &OpenAiProvider, messages: &[Message]) -> Result<Completion> {
        let tools = tools();
        let options = GenerationOptions::default();
        provider
            .complete(CompletionRequest {
                messages,
                tools: &tools,
                response_format: ResponseFormat::JsonObject,
                options: &options,
            })
            .await
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "{\"resourceType\":\"Encounter\"}",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 15, "total_tokens": 27}
        });
        let (_server, provider) = setup_mock_server(200, body).await;

        let completion = complete(&provider, &[Message::system("sys"), Message::user("note")])
            .await
            .unwrap();

        assert_eq!(completion.message.role, Role::Assistant);
        assert_eq!(completion.message.text(), r#"{"resourceType":"Encounter"}"#);
        assert!(!completion.message.has_tool_calls());
        assert_eq!(completion.model, "gpt-4o-2024-08-06");
        assert_eq!(completion.usage.unwrap().total_tokens, 27);
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_complete_tool_request() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {"name": "uuidv4", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let (_server, provider) = setup_mock_server(200, body).await;

        let completion = complete(&provider, &[Message::system("sys")]).await.unwrap();

        assert_eq!(
            completion.message.tool_calls,
            vec![ToolCallRequest::new("call_123", "uuidv4", "{}")]
        );
        assert!(completion.usage.is_none());
        assert_eq!(completion.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_request_payload_and_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .and(header("openai-organization", "org-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "response_format": {"type": "json_object"},
                "tools": [{"type": "function", "function": {"name": "fhir-validate"}}],
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "assistant", "tool_calls": [
                        {"id": "call_1", "function": {"name": "fhir-validate", "arguments": "{\"resource\":{}}"}}
                    ]},
                    {"role": "tool", "tool_call_id": "call_1", "content": "{}"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{}"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(&mock_server)).unwrap();
        let messages = vec![
            Message::system("sys"),
            Message::assistant_tool_calls(vec![ToolCallRequest::new(
                "call_1",
                "fhir-validate",
                r#"{"resource":{}}"#,
            )]),
            Message::tool("{}", "call_1"),
        ];

        complete(&provider, &messages).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (_s, provider) = setup_mock_server(429, json!({"error": {"message": "slow down"}})).await;
        assert!(matches!(
            complete(&provider, &[Message::system("sys")]).await,
            Err(AgentError::RateLimited(_))
        ));

        let (_s, provider) = setup_mock_server(401, json!({"error": {"message": "bad key"}})).await;
        assert!(matches!(
            complete(&provider, &[Message::system("sys")]).await,
            Err(AgentError::Auth(_))
        ));

        let (_s, provider) = setup_mock_server(503, json!({})).await;
        assert!(matches!(
            complete(&provider, &[Message::system("sys")]).await,
            Err(AgentError::ProviderUnavailable(_))
        ));

        let (_s, provider) = setup_mock_server(400, json!({"error": {"message": "bad request"}})).await;
        let err = complete(&provider, &[Message::system("sys")]).await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
        assert!(err.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn test_error_object_in_ok_body() {
        let body = json!({"error": {"message": "context_length_exceeded"}});
        let (_server, provider) = setup_mock_server(200, body).await;

        let err = complete(&provider, &[Message::system("sys")]).await.unwrap_err();
        assert!(err.to_string().contains("context_length_exceeded"));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            OpenAiProvider::new(OpenAiConfig::default()),
            Err(AgentError::Config(_))
        ));
    }
}
