//! File output sink

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use etl_core::{OutputSink, Result};

/// Writes the artifact to a file, replacing any previous content
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
