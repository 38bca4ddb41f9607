use crate::domain::services::OutputSink;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs package-manager commands whose output is streamed to the UI.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `brew <args>`; returns only after all output reached `sink`.
    async fn run(&self, args: &[String], sink: Arc<dyn OutputSink>) -> Result<()>;

    async fn run_tap(&self, tap: &str, sink: Arc<dyn OutputSink>) -> Result<()> {
        self.run(&["tap".to_string(), tap.to_string()], sink).await
    }

    async fn is_tap_installed(&self, tap: &str) -> bool;
}
