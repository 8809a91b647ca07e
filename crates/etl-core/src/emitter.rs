//! Result Emitter
//!
//! Turns the model's final answer into the run's single output artifact.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};

/// Parse the final answer text as a JSON object.
///
/// The contract with the model is JSON-only output, so nothing is stripped
/// or repaired here: surrounding prose or code fences fail the parse.
pub fn parse_final_answer(text: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AgentError::FinalAnswer(e.to_string()))?;

    if !value.is_object() {
        return Err(AgentError::FinalAnswer(format!(
            "expected an object, got {}",
            json_kind(&value)
        )));
    }

    Ok(value)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Destination of the output artifact (file, object store, ...)
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Persist the serialized artifact
    async fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Where the artifact went, for logs
    fn describe(&self) -> String;
}

/// Serializes a resource and hands it to an [`OutputSink`]
pub struct ResultEmitter<S> {
    sink: S,
    pretty: bool,
}

impl<S: OutputSink> ResultEmitter<S> {
    pub const fn new(sink: S) -> Self {
        Self { sink, pretty: false }
    }

    /// Indented output instead of compact
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Canonical serialization: object keys sorted, compact unless `pretty`
    pub fn serialize(&self, resource: &Value) -> Result<Vec<u8>> {
        // serde_json's Map is ordered by key unless `preserve_order` is on
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(resource)?
        } else {
            serde_json::to_vec(resource)?
        };
        Ok(bytes)
    }

    /// Serialize and write; returns the number of bytes written
    pub async fn emit(&self, resource: &Value) -> Result<usize> {
        let bytes = self.serialize(resource)?;
        self.sink.write(&bytes).await?;
        tracing::info!(
            destination = %self.sink.describe(),
            bytes = bytes.len(),
            "Wrote output artifact"
        );
        Ok(bytes.len())
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

/// In-memory sink (for development/testing)
#[derive(Default)]
pub struct MemorySink {
    written: Mutex<Option<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last artifact written, if any
    pub async fn contents(&self) -> Option<Vec<u8>> {
        self.written.lock().await.clone()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        *self.written.lock().await = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
