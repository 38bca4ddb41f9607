use crate::domain::entities::PackageType;
use anyhow::Result;
use async_trait::async_trait;

/// Remote JSON datasets served over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteDataset {
    Formulae,
    Casks,
    FormulaAnalytics,
    CaskAnalytics,
}

impl RemoteDataset {
    pub fn path(self) -> &'static str {
        match self {
            RemoteDataset::Formulae => "formula.json",
            RemoteDataset::Casks => "cask.json",
            RemoteDataset::FormulaAnalytics => "analytics/install-on-request/90d.json",
            RemoteDataset::CaskAnalytics => "analytics/cask-install/90d.json",
        }
    }
}

/// Everything the data layer needs from the package manager and its HTTP API.
///
/// Raw JSON is returned as bytes so the caller can cache exactly what it decoded.
#[async_trait]
pub trait PackageManagerPort: Send + Sync {
    /// `brew --version`
    async fn version(&self) -> Result<String>;
    /// `brew --prefix`
    async fn prefix(&self) -> Result<String>;
    /// `brew info --json=v1 --installed`
    async fn installed_formulae_json(&self) -> Result<Vec<u8>>;
    /// `brew list --formula` / `brew list --cask`, one name per line.
    async fn installed_names(&self, package_type: PackageType) -> Result<Vec<String>>;
    /// `brew list --formula <name>` / `brew list --cask <name>` exit status.
    async fn is_installed(&self, name: &str, package_type: PackageType) -> bool;
    /// `brew info --json=v1 <names>` / `brew info --json=v2 --cask <names>`
    async fn info_json(&self, names: &[String], package_type: PackageType) -> Result<Vec<u8>>;
    async fn fetch_remote(&self, dataset: RemoteDataset) -> Result<Vec<u8>>;
}
