//! Run bookkeeping
//!
//! Identifies a single transform run and summarizes what happened during it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::provider::TokenUsage;

/// Unique run identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of one agent run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub id: RunId,

    /// Model used for this run
    pub model: String,

    /// Inference rounds performed
    pub rounds: usize,

    /// Tool calls executed, by tool name
    pub tool_calls: BTreeMap<String, usize>,

    /// Tool calls that produced an error result
    pub tool_failures: usize,

    /// Accumulated token usage reported by the provider
    pub usage: TokenUsage,

    /// Conversation length when the run ended
    pub messages: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(id: RunId, model: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
            rounds: 0,
            tool_calls: BTreeMap::new(),
            tool_failures: 0,
            usage: TokenUsage::default(),
            messages: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_round(&mut self, usage: Option<TokenUsage>) {
        self.rounds += 1;
        if let Some(u) = usage {
            self.usage.prompt_tokens = self.usage.prompt_tokens.saturating_add(u.prompt_tokens);
            self.usage.completion_tokens =
                self.usage.completion_tokens.saturating_add(u.completion_tokens);
            self.usage.total_tokens = self.usage.total_tokens.saturating_add(u.total_tokens);
        }
    }

    pub fn record_tool(&mut self, name: &str, success: bool) {
        *self.tool_calls.entry(name.to_string()).or_default() += 1;
        if !success {
            self.tool_failures += 1;
        }
    }

    pub fn finish(&mut self, messages: usize) {
        self.messages = messages;
        self.finished_at = Some(Utc::now());
    }

    pub fn total_tool_calls(&self) -> usize {
        self.tool_calls.values().sum()
    }

    /// Wall time, up to now if the run is still going
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_distinct() {
        assert_ne!(RunId::new(), RunId::new());
        assert_eq!(RunId::from_string("abc").as_str(), "abc");
    }

    #[test]
    fn test_report_accounting() {
        let mut report = RunReport::new(RunId::new(), "gpt-4o");
        report.record_round(Some(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }));
        report.record_round(None);
        report.record_tool("uuidv4", true);
        report.record_tool("fhir-validate", false);
        report.record_tool("uuidv4", true);
        report.finish(7);

        assert_eq!(report.rounds, 2);
        assert_eq!(report.usage.total_tokens, 15);
        assert_eq!(report.total_tool_calls(), 3);
        assert_eq!(report.tool_calls["uuidv4"], 2);
        assert_eq!(report.tool_failures, 1);
        assert_eq!(report.messages, 7);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_token_totals_saturate() {
        let mut report = RunReport::new(RunId::new(), "gpt-4o");
        let huge = TokenUsage {
            prompt_tokens: u32::MAX,
            completion_tokens: 1,
            total_tokens: u32::MAX,
        };
        report.record_round(Some(huge));
        report.record_round(Some(huge));

        assert_eq!(report.usage.prompt_tokens, u32::MAX);
        assert_eq!(report.usage.completion_tokens, 2);
        assert_eq!(report.usage.total_tokens, u32::MAX);
    }
}
