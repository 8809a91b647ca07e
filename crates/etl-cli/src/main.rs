//! fhir-etl
//!
//! Reads a clinical encounter note, lets the model build a US Core
//! Encounter with the help of a FHIR validator and a UUID generator, and
//! writes the resulting resource as JSON.

mod config;
mod sink;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use etl_core::{AgentBuilder, AgentError, AgentOutcome, ResponseFormat, ResultEmitter};
use etl_runtime::{OpenAiConfig, OpenAiProvider};
use fhir_encounter::{
    ConformanceValidator, InfernoValidator, MockValidator, SYSTEM_PROMPT, StructureDefinition,
    initial_conversation, registry,
};

use crate::config::{Cli, RunConfig, ValidatorChoice};
use crate::sink::FileSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,fhir_etl=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunConfig::from_cli(Cli::parse())?;

    let result = match openai_config(&config) {
        Ok(openai) => run(&config, openai).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        match e.downcast_ref::<AgentError>() {
            Some(agent_error) => tracing::error!(
                error = %agent_error,
                "{}", agent_error.user_message()
            ),
            None => tracing::error!(error = %e, "ETL run failed"),
        }
    }
    result.map(|_| ())
}

/// Credentials come from the environment; the deadline from the CLI
fn openai_config(config: &RunConfig) -> Result<OpenAiConfig> {
    Ok(OpenAiConfig {
        timeout_secs: config.call_timeout.as_secs(),
        ..OpenAiConfig::from_env()?
    })
}

/// One complete transform: note in, resource out
async fn run(config: &RunConfig, openai: OpenAiConfig) -> Result<AgentOutcome> {
    let note = tokio::fs::read_to_string(&config.input)
        .await
        .with_context(|| format!("reading input note {}", config.input.display()))?;
    if note.trim().is_empty() {
        bail!("input note {} is empty", config.input.display());
    }

    let profile = match &config.structure_definition {
        Some(path) => StructureDefinition::load(path)
            .await
            .with_context(|| format!("loading structure definition {}", path.display()))?,
        None => StructureDefinition::bundled()?,
    };

    let validator: Arc<dyn ConformanceValidator> = match &config.validator {
        ValidatorChoice::Remote { base_url } => {
            Arc::new(InfernoValidator::new(base_url.as_str(), config.call_timeout)?)
        }
        ValidatorChoice::Offline => Arc::new(MockValidator::new(&profile)),
    };

    let profile_url = config.profile.as_deref().unwrap_or_else(|| profile.url());
    let tools = registry(validator.clone(), profile_url)?;
    let provider = Arc::new(OpenAiProvider::new(openai)?);

    tracing::info!(
        input = %config.input.display(),
        model = %config.model,
        validator = validator.name(),
        profile = %profile_url,
        tools = tools.len(),
        "Starting transform"
    );

    let mut builder = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .system_prompt(SYSTEM_PROMPT)
        .model(config.model.as_str())
        .max_rounds(config.max_rounds)
        .call_timeout(config.call_timeout)
        .response_format(ResponseFormat::JsonObject);
    if let Some(temperature) = config.temperature {
        builder = builder.temperature(temperature);
    }
    let agent = builder.build()?;

    let mut conversation = initial_conversation(&profile, &note)?;
    let outcome = agent.run(&mut conversation).await?;

    let emitter = ResultEmitter::new(FileSink::new(&config.output)).pretty(config.pretty);
    emitter.emit(&outcome.resource).await?;

    let report = &outcome.report;
    tracing::info!(
        run_id = %report.id,
        rounds = report.rounds,
        tool_calls = ?report.tool_calls,
        tool_failures = report.tool_failures,
        total_tokens = report.usage.total_tokens,
        duration_ms = report.duration().num_milliseconds(),
        output = %emitter.sink().path().display(),
        "Transform complete"
    );

    Ok(outcome)
}
