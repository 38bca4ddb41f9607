use super::api::ApiClient;
use super::command::{BrewCommand, parse_lines};
use crate::domain::entities::{AppConfig, PackageType};
use crate::domain::repositories::{PackageManagerPort, RemoteDataset};
use anyhow::Result;
use async_trait::async_trait;

/// Production port: shells out to `brew` and downloads catalogs over HTTP.
pub struct BrewPackageManager {
    brew: BrewCommand,
    api: ApiClient,
}

impl BrewPackageManager {
    pub fn new(brew: BrewCommand, api: ApiClient) -> Self {
        Self { brew, api }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url.clone(), config.http_timeout())?;
        Ok(Self::new(BrewCommand::new(config.brew_path.clone()), api))
    }
}

#[async_trait]
impl PackageManagerPort for BrewPackageManager {
    async fn version(&self) -> Result<String> {
        Ok(self.brew.execute_text(&BrewCommand::version_args()).await?)
    }

    async fn prefix(&self) -> Result<String> {
        Ok(self.brew.execute_text(&BrewCommand::prefix_args()).await?)
    }

    async fn installed_formulae_json(&self) -> Result<Vec<u8>> {
        Ok(self.brew.execute(&BrewCommand::installed_info_args()).await?)
    }

    async fn installed_names(&self, package_type: PackageType) -> Result<Vec<String>> {
        let output = self
            .brew
            .execute_text(&BrewCommand::list_args(package_type))
            .await?;
        Ok(parse_lines(&output))
    }

    async fn is_installed(&self, name: &str, package_type: PackageType) -> bool {
        self.brew
            .succeeds(&BrewCommand::list_one_args(name, package_type))
            .await
    }

    async fn info_json(&self, names: &[String], package_type: PackageType) -> Result<Vec<u8>> {
        Ok(self
            .brew
            .execute(&BrewCommand::info_args(names, package_type))
            .await?)
    }

    async fn fetch_remote(&self, dataset: RemoteDataset) -> Result<Vec<u8>> {
        Ok(self.api.fetch(dataset).await?)
    }
}
