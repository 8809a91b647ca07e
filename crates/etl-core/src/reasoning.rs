//! Agent Loop
//!
//! Drives the model through rounds of "answer or ask for a tool":
//!
//! ```text
//!   AwaitingModel ──tool calls──▶ HandlingToolCalls ──▶ AwaitingModel ...
//!         │
//!         └──no tool calls──▶ Done (final answer parsed as a JSON object)
//! ```
//!
//! The loop is iterative with a hard round budget. Tool calls of one turn are
//! executed in request order and each gets exactly one tool message. The
//! model decides when it is finished; tool output (validation verdicts
//! included) is only ever fed back as context.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::emitter::parse_final_answer;
use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role, ToolCallRequest};
use crate::provider::{CompletionRequest, GenerationOptions, LlmProvider, ResponseFormat};
use crate::run::{RunId, RunReport};
use crate::tool::{ToolDescriptor, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt used by [`Agent::ask`]
    pub system_prompt: String,

    /// Maximum inference rounds before giving up
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Output constraint sent with every request
    pub response_format: ResponseFormat,

    /// Deadline for each network call (inference or tool)
    pub call_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: 10,
            generation: GenerationOptions::default(),
            response_format: ResponseFormat::JsonObject,
            call_timeout: Duration::from_secs(120),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are the transform layer of an ETL. \
Use the tools you are given when they help, and answer with a single JSON object.";

/// What a successful run produced
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    /// The final answer parsed as a JSON object
    pub resource: Value,

    /// The final answer text as the model sent it
    pub answer: String,

    pub report: RunReport,
}

/// Loop state; failures leave the loop through `Err`
enum Step {
    AwaitingModel,
    HandlingToolCalls(Vec<ToolCallRequest>),
    Done(String),
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Run a fresh conversation made of the configured system prompt and
    /// one user request
    pub async fn ask(&self, request: &str) -> Result<AgentOutcome> {
        let mut conversation = Conversation::with_system_prompt(self.config.system_prompt.clone());
        conversation.push(Message::user(request))?;
        self.run(&mut conversation).await
    }

    /// Run the loop until the model gives a final answer.
    ///
    /// The conversation is only ever appended to; on failure it holds
    /// everything up to the point of failure.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<AgentOutcome> {
        if conversation.messages().first().map(|m| m.role) != Some(Role::System) {
            return Err(AgentError::Conversation(
                "conversation must start with a system message".into(),
            ));
        }

        let run_id = RunId::new();
        let span = info_span!(
            "agent_run",
            run_id = %run_id,
            model = %self.config.generation.model,
            provider = %self.provider.name(),
        );

        self.drive(run_id, conversation).instrument(span).await
    }

    async fn drive(&self, run_id: RunId, conversation: &mut Conversation) -> Result<AgentOutcome> {
        let descriptors = self.tools.descriptors();
        let mut report = RunReport::new(run_id, &self.config.generation.model);
        let mut step = Step::AwaitingModel;

        info!(tools = ?self.tools.names(), max_rounds = self.config.max_rounds, "Starting agent run");

        loop {
            step = match step {
                Step::AwaitingModel => {
                    if report.rounds >= self.config.max_rounds {
                        warn!(rounds = report.rounds, "Round budget exhausted");
                        return Err(AgentError::MaxRounds(self.config.max_rounds));
                    }

                    let message = self.next_message(conversation, &descriptors, &mut report).await?;
                    let tool_calls = message.tool_calls.clone();
                    let content = message.content.clone();
                    conversation.push(message)?;

                    if tool_calls.is_empty() {
                        match content.filter(|c| !c.trim().is_empty()) {
                            Some(answer) => Step::Done(answer),
                            None => return Err(AgentError::EmptyAnswer),
                        }
                    } else {
                        Step::HandlingToolCalls(tool_calls)
                    }
                }

                Step::HandlingToolCalls(requests) => {
                    for request in &requests {
                        let reply = self.call_tool(request, &mut report).await?;
                        conversation.push(reply)?;
                    }
                    Step::AwaitingModel
                }

                Step::Done(answer) => {
                    let resource = parse_final_answer(&answer)?;
                    report.finish(conversation.len());
                    info!(
                        rounds = report.rounds,
                        tool_calls = report.total_tool_calls(),
                        tool_failures = report.tool_failures,
                        total_tokens = report.usage.total_tokens,
                        "Agent run completed"
                    );
                    return Ok(AgentOutcome {
                        resource,
                        answer,
                        report,
                    });
                }
            };
        }
    }

    /// One inference round over the complete conversation
    async fn next_message(
        &self,
        conversation: &Conversation,
        descriptors: &[ToolDescriptor],
        report: &mut RunReport,
    ) -> Result<Message> {
        let round = report.rounds + 1;
        debug!(
            round,
            messages = conversation.len(),
            estimated_tokens = conversation.estimate_tokens(),
            "Requesting completion"
        );

        let request = CompletionRequest {
            messages: conversation.messages(),
            tools: descriptors,
            response_format: self.config.response_format,
            options: &self.config.generation,
        };

        let completion = tokio::time::timeout(self.config.call_timeout, self.provider.complete(request))
            .await
            .map_err(|_| AgentError::Timeout {
                operation: format!("{} completion", self.provider.name()),
                secs: self.config.call_timeout.as_secs(),
            })??;

        report.record_round(completion.usage);

        let message = completion.message;
        if message.role != Role::Assistant {
            return Err(AgentError::Provider(format!(
                "expected an assistant message, got role '{}'",
                message.role
            )));
        }

        let mut ids = HashSet::new();
        if let Some(dup) = message.tool_calls.iter().find(|c| !ids.insert(c.id.as_str())) {
            return Err(AgentError::Provider(format!(
                "tool call id '{}' repeated within one response",
                dup.id
            )));
        }

        info!(
            round,
            tool_calls = message.tool_calls.len(),
            finish_reason = ?completion.finish_reason,
            "Model responded"
        );
        Ok(message)
    }

    /// Execute one requested tool and build its reply.
    ///
    /// Unparseable arguments end the run. Every other failure, an unknown
    /// tool name included, is turned into an error payload for the model.
    async fn call_tool(&self, request: &ToolCallRequest, report: &mut RunReport) -> Result<Message> {
        let call = request.parse()?;

        info!(tool = %call.name, call_id = %call.id, "Executing tool");

        let outcome = tokio::time::timeout(self.config.call_timeout, self.tools.execute(&call)).await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(AgentError::ToolNotFound(name))) => {
                warn!(tool = %name, call_id = %call.id, "Model requested an unregistered tool");
                ToolResult::failure(&name, AgentError::ToolNotFound(name.clone()))
            }
            Ok(Err(e)) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
                ToolResult::failure(&call.name, e)
            }
            Err(_) => {
                let e = AgentError::Timeout {
                    operation: format!("tool '{}'", call.name),
                    secs: self.config.call_timeout.as_secs(),
                };
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call timed out");
                ToolResult::failure(&call.name, e)
            }
        };

        let result = result.with_id(call.id);
        report.record_tool(&call.name, result.success);
        debug!(tool = %call.name, success = result.success, bytes = result.output.len(), "Tool finished");

        let id = result.id.unwrap_or_default();
        Ok(Message::tool(result.output, id))
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Result<Self> {
        self.tools.register(tool)?;
        Ok(self)
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = Some(temp);
        self
    }

    #[must_use]
    pub fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.config.response_format = format;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_rounds == 0 {
            return Err(AgentError::Config("max_rounds must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}
