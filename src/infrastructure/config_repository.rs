use crate::domain::entities::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigRepository {
    config_path: PathBuf,
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRepository {
    pub fn new() -> Self {
        let config_dir = if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("bbrew")
        } else {
            PathBuf::from(".")
        };

        Self::at(config_dir.join("config.json"))
    }

    pub fn at(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Missing file means defaults; a malformed one is an error.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::debug!("No config at {}, using defaults", self.config_path.display());
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read {}", self.config_path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ConfigRepository::at(dir.path().join("config.json"));
        let config = repo.load().unwrap();
        assert_eq!(config.brew_path, "brew");
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ConfigRepository::at(dir.path().join("nested").join("config.json"));
        let config = AppConfig {
            stream_batch_size: 42,
            ..Default::default()
        };
        repo.save(&config).unwrap();
        assert_eq!(repo.load().unwrap().stream_batch_size, 42);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ConfigRepository::at(path).load().is_err());
    }
}
