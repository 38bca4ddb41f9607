//! HTTP client for the public formula/cask catalog and analytics endpoints.

use super::error::BrewError;
use crate::domain::repositories::RemoteDataset;
use std::time::Duration;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BrewError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("bbrew/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn url_for(&self, dataset: RemoteDataset) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), dataset.path())
    }

    /// Downloads the raw body; non-2xx responses are errors.
    pub async fn fetch(&self, dataset: RemoteDataset) -> Result<Vec<u8>, BrewError> {
        let url = self.url_for(dataset);
        tracing::info!("Downloading {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let api = ApiClient::new("https://formulae.brew.sh/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            api.url_for(RemoteDataset::CaskAnalytics),
            "https://formulae.brew.sh/api/analytics/cask-install/90d.json"
        );
        assert_eq!(
            api.url_for(RemoteDataset::Formulae),
            "https://formulae.brew.sh/api/formula.json"
        );
    }
}
