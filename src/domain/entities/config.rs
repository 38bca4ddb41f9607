use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub brew_path: String,
    pub cache_dir: Option<PathBuf>,
    pub api_base_url: String,
    pub stream_batch_size: usize,
    pub stream_flush_interval_ms: u64,
    pub update_check_timeout_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brew_path: "brew".to_string(),
            cache_dir: None,
            api_base_url: "https://formulae.brew.sh/api".to_string(),
            stream_batch_size: 500,
            stream_flush_interval_ms: 150,
            update_check_timeout_secs: 60,
            http_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn stream_flush_interval(&self) -> Duration {
        Duration::from_millis(self.stream_flush_interval_ms.max(1))
    }

    pub fn update_check_timeout(&self) -> Duration {
        Duration::from_secs(self.update_check_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// `cache_dir` override, else `$XDG_CACHE_HOME/bbrew`, else `$HOME/.cache/bbrew`.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        if let Some(cache_home) = std::env::var_os("XDG_CACHE_HOME") {
            PathBuf::from(cache_home).join("bbrew")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".cache").join("bbrew")
        } else {
            PathBuf::from(".cache").join("bbrew")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"brew_path":"/opt/homebrew/bin/brew"}"#).unwrap();
        assert_eq!(config.brew_path, "/opt/homebrew/bin/brew");
        assert_eq!(config.stream_flush_interval_ms, 150);
        assert_eq!(config.update_check_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let config = AppConfig {
            cache_dir: Some(PathBuf::from("/tmp/bbrew-test")),
            ..Default::default()
        };
        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/tmp/bbrew-test"));
    }
}
