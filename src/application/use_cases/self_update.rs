use crate::domain::entities::{Formula, PackageType};
use crate::domain::repositories::PackageManagerPort;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Formula that publishes released versions of this tool.
pub const SELF_FORMULA: &str = "valkyrie00/bbrew/bbrew";

/// Asks the package manager for the latest released version of this tool.
pub struct CheckForUpdates {
    port: Arc<dyn PackageManagerPort>,
    timeout: Duration,
}

impl CheckForUpdates {
    pub fn new(port: Arc<dyn PackageManagerPort>, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// Newer version string, or `None` when up to date. Timeouts and lookup errors
    /// also read as "no update".
    pub async fn execute(&self, current_version: &str) -> Option<String> {
        let latest = match tokio::time::timeout(self.timeout, self.latest_version()).await {
            Ok(Ok(latest)) => latest,
            Ok(Err(e)) => {
                tracing::debug!("Update check failed: {:#}", e);
                return None;
            }
            Err(_) => {
                tracing::debug!("Update check timed out after {:?}", self.timeout);
                return None;
            }
        };

        if latest.is_empty() || latest == current_version {
            None
        } else {
            tracing::info!("Update available: {} -> {}", current_version, latest);
            Some(latest)
        }
    }

    async fn latest_version(&self) -> Result<String> {
        let body = self
            .port
            .info_json(&[SELF_FORMULA.to_string()], PackageType::Formula)
            .await
            .context("failed to fetch latest version from tap")?;
        let info: Vec<Formula> =
            serde_json::from_slice(&body).context("failed to parse version info")?;
        info.into_iter()
            .next()
            .and_then(|formula| formula.versions.stable)
            .context("no version information found")
    }
}
