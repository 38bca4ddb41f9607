use serde::{Deserialize, Serialize};

/// Cask record as emitted by `brew info --json=v2 --cask` and the remote catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cask {
    pub token: String,
    #[serde(default)]
    pub full_token: String,
    #[serde(default)]
    pub old_tokens: Vec<String>,
    #[serde(default)]
    pub tap: Option<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Installed version, `None` when the cask is not installed.
    #[serde(default)]
    pub installed: Option<String>,
    #[serde(default)]
    pub installed_time: Option<i64>,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub disabled: bool,

    #[serde(skip)]
    pub locally_installed: bool,
    #[serde(skip)]
    pub analytics_90d_rank: i64,
    #[serde(skip)]
    pub analytics_90d_downloads: i64,
}

/// Envelope of `brew info --json=v2` output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaskInfoResponse {
    #[serde(default)]
    pub casks: Vec<Cask>,
}
