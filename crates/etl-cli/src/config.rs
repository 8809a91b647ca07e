//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use fhir_encounter::validator::DEFAULT_BASE_URL;

/// Transform a clinical encounter note into a US Core Encounter resource
#[derive(Parser, Debug)]
#[command(name = "fhir-etl")]
#[command(author, version, about = "Clinical note to US Core Encounter ETL")]
pub struct Cli {
    /// Clinical note to transform (UTF-8 text)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the resulting resource
    #[arg(short, long, default_value = "out.json")]
    pub output: PathBuf,

    /// Model to use
    #[arg(short, long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Inference rounds before giving up
    #[arg(long, default_value_t = 10)]
    pub max_rounds: usize,

    /// Sampling temperature (provider default when unset)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Deadline in seconds for each model or validator call
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Base URL of the FHIR validator API
    #[arg(long, env = "FHIR_VALIDATOR_URL", default_value = DEFAULT_BASE_URL)]
    pub validator_url: String,

    /// Canonical URL of the profile resources are validated against
    /// (defaults to the url of the embedded StructureDefinition)
    #[arg(long, env = "FHIR_PROFILE")]
    pub profile: Option<String>,

    /// StructureDefinition JSON to embed instead of the bundled one
    #[arg(long)]
    pub structure_definition: Option<PathBuf>,

    /// Validate locally against required elements only (no network)
    #[arg(long)]
    pub offline_validation: bool,

    /// Indent the output
    #[arg(long)]
    pub pretty: bool,
}

/// Validated settings for one run
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub model: String,
    pub max_rounds: usize,
    pub temperature: Option<f32>,
    pub call_timeout: Duration,
    pub validator: ValidatorChoice,
    /// Explicit profile; `None` follows the StructureDefinition in use
    pub profile: Option<String>,
    pub structure_definition: Option<PathBuf>,
    pub pretty: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidatorChoice {
    Remote { base_url: String },
    Offline,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.max_rounds == 0 {
            bail!("--max-rounds must be at least 1");
        }
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        if let Some(t) = cli.temperature {
            if !(0.0..=2.0).contains(&t) {
                bail!("--temperature must be between 0 and 2, got {t}");
            }
        }
        if cli.profile.as_deref().is_some_and(|p| p.trim().is_empty()) {
            bail!("profile URL is empty");
        }

        let validator = if cli.offline_validation {
            ValidatorChoice::Offline
        } else {
            ValidatorChoice::Remote {
                base_url: cli.validator_url,
            }
        };

        Ok(Self {
            input: cli.input,
            output: cli.output,
            model: cli.model,
            max_rounds: cli.max_rounds,
            temperature: cli.temperature,
            call_timeout: Duration::from_secs(cli.timeout_secs),
            validator,
            profile: cli.profile,
            structure_definition: cli.structure_definition,
            pretty: cli.pretty,
        })
    }
}
