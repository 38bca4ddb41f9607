//! Cache-or-fetch loading of the six package datasets and their merge into [`Package`] rows.

use crate::domain::entities::{
    Analytics, AnalyticsItem, Cask, CaskInfoResponse, Formula, Package, PackageKey, PackageType,
};
use crate::domain::repositories::{PackageManagerPort, RemoteDataset};
use crate::infrastructure::cache::{Cache, CacheFile};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;

const UNKNOWN_PREFIX: &str = "Unknown";

/// One dataset of a full load. [`DataStage::ALL`] is the load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStage {
    InstalledFormulae,
    RemoteFormulae,
    FormulaAnalytics,
    InstalledCasks,
    RemoteCasks,
    CaskAnalytics,
}

impl DataStage {
    pub const ALL: [DataStage; 6] = [
        DataStage::InstalledFormulae,
        DataStage::RemoteFormulae,
        DataStage::FormulaAnalytics,
        DataStage::InstalledCasks,
        DataStage::RemoteCasks,
        DataStage::CaskAnalytics,
    ];

    fn failure(self) -> &'static str {
        match self {
            DataStage::InstalledFormulae => "failed to load installed formulae",
            DataStage::RemoteFormulae => "failed to load remote formulae",
            DataStage::FormulaAnalytics => "failed to load formulae analytics",
            DataStage::InstalledCasks => "failed to load installed casks",
            DataStage::RemoteCasks => "failed to load remote casks",
            DataStage::CaskAnalytics => "failed to load cask analytics",
        }
    }
}

/// Everything loaded by the last `setup_data`. Swapped as a whole, never edited in place.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    installed: Arc<Vec<Formula>>,
    remote: Arc<Vec<Formula>>,
    analytics: Arc<HashMap<String, AnalyticsItem>>,
    installed_casks: Arc<Vec<Cask>>,
    remote_casks: Arc<Vec<Cask>>,
    cask_analytics: Arc<HashMap<String, AnalyticsItem>>,
}

pub struct PackageRepository {
    port: Arc<dyn PackageManagerPort>,
    cache: Cache,
    snapshot: RwLock<Arc<Snapshot>>,
    prefix: OnceCell<String>,
}

impl PackageRepository {
    pub fn new(port: Arc<dyn PackageManagerPort>, cache: Cache) -> Self {
        Self {
            port,
            cache,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            prefix: OnceCell::new(),
        }
    }

    pub fn port(&self) -> Arc<dyn PackageManagerPort> {
        Arc::clone(&self.port)
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn current(&self) -> Arc<Snapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, next: Snapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
    }

    /// Loads installed formulae, remote formulae, formula analytics, installed casks,
    /// remote casks and cask analytics, in that order.
    ///
    /// The first failing dataset aborts the run. Datasets loaded before it are still
    /// published; the failed one and the rest keep their previous contents.
    pub async fn setup_data(&self, force_download: bool) -> Result<()> {
        tracing::info!("Loading package data (force_download={})", force_download);
        self.prepare_cache();

        let mut result = Ok(());
        for stage in DataStage::ALL {
            result = self.load_stage(stage, force_download).await;
            if result.is_err() {
                break;
            }
        }

        match &result {
            Ok(()) => tracing::info!("Package data loaded"),
            Err(e) => tracing::error!("Package data load failed: {:#}", e),
        }
        result
    }

    /// Creates the cache directory; failure only costs caching.
    pub fn prepare_cache(&self) {
        if let Err(e) = self.cache.ensure_dir() {
            tracing::warn!("Cache directory {:?} unavailable: {}", self.cache.dir(), e);
        }
    }

    /// Loads one dataset and publishes it right away. On error the previous contents
    /// of that dataset are kept.
    pub async fn load_stage(&self, stage: DataStage, force: bool) -> Result<()> {
        let mut next = (*self.current()).clone();
        match stage {
            DataStage::InstalledFormulae => {
                next.installed = Arc::new(self.load_installed(force).await.context(stage.failure())?);
            }
            DataStage::RemoteFormulae => {
                next.remote = Arc::new(
                    self.load_dataset(CacheFile::FORMULAE, force, |v: &Vec<Formula>| !v.is_empty(), || {
                        self.port.fetch_remote(RemoteDataset::Formulae)
                    })
                    .await
                    .context(stage.failure())?,
                );
            }
            DataStage::FormulaAnalytics => {
                next.analytics = Arc::new(
                    self.load_analytics(CacheFile::FORMULA_ANALYTICS, RemoteDataset::FormulaAnalytics, force)
                        .await
                        .context(stage.failure())?
                        .by_formula(),
                );
            }
            DataStage::InstalledCasks => {
                next.installed_casks =
                    Arc::new(self.load_installed_casks(force).await.context(stage.failure())?);
            }
            DataStage::RemoteCasks => {
                next.remote_casks = Arc::new(
                    self.load_dataset(CacheFile::CASKS, force, |v: &Vec<Cask>| !v.is_empty(), || {
                        self.port.fetch_remote(RemoteDataset::Casks)
                    })
                    .await
                    .context(stage.failure())?,
                );
            }
            DataStage::CaskAnalytics => {
                next.cask_analytics = Arc::new(
                    self.load_analytics(CacheFile::CASK_ANALYTICS, RemoteDataset::CaskAnalytics, force)
                        .await
                        .context(stage.failure())?
                        .by_cask(),
                );
            }
        }
        self.publish(next);
        tracing::debug!("Loaded {:?}", stage);
        Ok(())
    }

    /// Re-reads only the installed formulae and casks from the package manager, keeping
    /// the remote catalogs and analytics. Used after install/remove/update.
    pub async fn reload_installed(&self) -> Result<()> {
        let mut next = (*self.current()).clone();
        next.installed = Arc::new(
            self.load_installed(true)
                .await
                .context(DataStage::InstalledFormulae.failure())?,
        );
        next.installed_casks = Arc::new(
            self.load_installed_casks(true)
                .await
                .context(DataStage::InstalledCasks.failure())?,
        );
        self.publish(next);
        tracing::debug!("Installed state reloaded");
        Ok(())
    }

    /// Cache first unless forced; a missing, undersized, undecodable or rejected blob
    /// falls through to `fetch`, whose body is written back on success.
    async fn load_dataset<T, A, F, Fut>(
        &self,
        file: CacheFile,
        force: bool,
        accept: A,
        fetch: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        A: Fn(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if !force {
            if let Some(data) = self.cache.read_file(file) {
                match serde_json::from_slice::<T>(&data) {
                    Ok(value) if accept(&value) => {
                        tracing::debug!("Using cached {}", file.name);
                        return Ok(value);
                    }
                    Ok(_) => tracing::debug!("Cached {} is empty, refetching", file.name),
                    Err(e) => tracing::debug!("Cached {} is unreadable ({}), refetching", file.name, e),
                }
            }
        }

        let body = fetch().await?;
        let value = serde_json::from_slice::<T>(&body)
            .with_context(|| format!("invalid JSON for {}", file.name))?;
        self.store(file, &body);
        Ok(value)
    }

    fn store(&self, file: CacheFile, body: &[u8]) {
        if let Err(e) = self.cache.write(file.name, body) {
            tracing::warn!("Failed to write cache file {}: {}", file.name, e);
        }
    }

    async fn load_analytics(
        &self,
        file: CacheFile,
        dataset: RemoteDataset,
        force: bool,
    ) -> Result<Analytics> {
        self.load_dataset(file, force, |a: &Analytics| !a.items.is_empty(), || {
            self.port.fetch_remote(dataset)
        })
        .await
    }

    async fn load_installed(&self, force: bool) -> Result<Vec<Formula>> {
        let mut installed: Vec<Formula> = self
            .load_dataset(CacheFile::INSTALLED_FORMULAE, force, |_: &Vec<Formula>| true, || {
                self.port.installed_formulae_json()
            })
            .await?;

        let prefix = self.prefix_path().await;
        for formula in &mut installed {
            formula.locally_installed = true;
            formula.local_path = Some(format!("{}/Cellar/{}", prefix, formula.name));
        }
        tracing::debug!("{} installed formulae", installed.len());
        Ok(installed)
    }

    /// Having no casks makes `brew list --cask` fail, so listing and info failures
    /// both read as "nothing installed".
    async fn load_installed_casks(&self, force: bool) -> Result<Vec<Cask>> {
        let file = CacheFile::INSTALLED_CASKS;
        if !force {
            if let Some(data) = self.cache.read_file(file) {
                match serde_json::from_slice::<CaskInfoResponse>(&data) {
                    Ok(response) => return Ok(mark_casks_installed(response.casks)),
                    Err(e) => tracing::debug!("Cached {} is unreadable ({}), refetching", file.name, e),
                }
            }
        }

        let names = match self.port.installed_names(PackageType::Cask).await {
            Ok(names) if !names.is_empty() => names,
            Ok(_) => return Ok(Vec::new()),
            Err(e) => {
                tracing::debug!("No installed casks: {:#}", e);
                return Ok(Vec::new());
            }
        };

        let body = match self.port.info_json(&names, PackageType::Cask).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not read installed cask info: {:#}", e);
                return Ok(Vec::new());
            }
        };

        let response: CaskInfoResponse =
            serde_json::from_slice(&body).context("invalid JSON for installed casks")?;
        self.store(file, &body);
        Ok(mark_casks_installed(response.casks))
    }

    /// `brew --prefix`, looked up once per repository.
    pub async fn prefix_path(&self) -> String {
        self.prefix
            .get_or_init(|| async {
                match self.port.prefix().await {
                    Ok(prefix) => prefix,
                    Err(e) => {
                        tracing::warn!("Could not resolve brew prefix: {:#}", e);
                        UNKNOWN_PREFIX.to_string()
                    }
                }
            })
            .await
            .clone()
    }

    pub async fn version(&self) -> Result<String> {
        self.port.version().await.context("failed to query brew version")
    }

    /// Merged formulae and casks: remote rows are defaults, installed rows win,
    /// positive analytics ranks decorate. Sorted by name.
    pub fn get_packages(&self) -> Vec<Package> {
        let snapshot = self.current();
        let mut merged: HashMap<PackageKey, Package> = HashMap::new();

        for formula in snapshot.remote.iter() {
            merged
                .entry((PackageType::Formula, formula.name.clone()))
                .or_insert_with(|| Package::from_formula(formula));
        }
        for formula in snapshot.installed.iter() {
            merged.insert((PackageType::Formula, formula.name.clone()), Package::from_formula(formula));
        }
        for cask in snapshot.remote_casks.iter() {
            merged
                .entry((PackageType::Cask, cask.token.clone()))
                .or_insert_with(|| Package::from_cask(cask));
        }
        for cask in snapshot.installed_casks.iter() {
            merged.insert((PackageType::Cask, cask.token.clone()), Package::from_cask(cask));
        }

        let mut packages: Vec<Package> = merged
            .into_values()
            .map(|mut package| {
                let analytics = match package.package_type {
                    PackageType::Formula => &snapshot.analytics,
                    PackageType::Cask => &snapshot.cask_analytics,
                };
                if let Some(item) = analytics.get(&package.name).filter(|a| a.number > 0) {
                    package.analytics_90d_rank = item.number;
                    package.analytics_90d_downloads = item.downloads();
                }
                package
            })
            .collect();

        sort_packages(&mut packages);
        packages
    }

    /// Formula records only, merged with the same precedence as [`Self::get_packages`].
    pub fn get_formulae(&self) -> Vec<Formula> {
        let snapshot = self.current();
        let mut merged: HashMap<String, Formula> = HashMap::new();

        for formula in snapshot.remote.iter() {
            merged
                .entry(formula.name.clone())
                .or_insert_with(|| formula.clone());
        }
        for formula in snapshot.installed.iter() {
            merged.insert(formula.name.clone(), formula.clone());
        }

        let mut formulae: Vec<Formula> = merged
            .into_values()
            .map(|mut formula| {
                if let Some(item) = snapshot.analytics.get(&formula.name).filter(|a| a.number > 0) {
                    formula.analytics_90d_rank = item.number;
                    formula.analytics_90d_downloads = item.downloads();
                }
                formula
            })
            .collect();

        formulae.sort_by(|a, b| a.name.cmp(&b.name));
        formulae
    }

    pub async fn is_package_installed(&self, name: &str, package_type: PackageType) -> bool {
        self.port.is_installed(name, package_type).await
    }

    pub async fn installed_cask_names(&self) -> HashSet<String> {
        self.installed_name_set(PackageType::Cask).await
    }

    pub async fn installed_formula_names(&self) -> HashSet<String> {
        self.installed_name_set(PackageType::Formula).await
    }

    async fn installed_name_set(&self, package_type: PackageType) -> HashSet<String> {
        match self.port.installed_names(package_type).await {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                tracing::debug!("Listing installed {} failed: {:#}", package_type, e);
                HashSet::new()
            }
        }
    }

    /// Batch `brew info`; when the batch call fails each name is retried alone and
    /// names that still fail are left out.
    pub async fn get_packages_info(
        &self,
        names: &[String],
        package_type: PackageType,
    ) -> HashMap<String, Package> {
        let mut result = HashMap::new();
        if names.is_empty() {
            return result;
        }

        match self.port.info_json(names, package_type).await {
            Ok(body) => match decode_packages(&body, package_type) {
                Ok(packages) => {
                    let installed = self.installed_name_set(package_type).await;
                    for package in packages {
                        let is_installed = installed.contains(&package.name);
                        result.insert(package.name.clone(), package.set_installed(is_installed));
                    }
                }
                Err(e) => tracing::warn!("Unreadable {} info: {:#}", package_type, e),
            },
            Err(e) => {
                tracing::debug!("Batch info failed ({:#}), retrying one by one", e);
                for name in names {
                    if let Some(package) = self.get_package_info(name, package_type).await {
                        result.insert(name.clone(), package);
                    }
                }
            }
        }

        result
    }

    async fn get_package_info(&self, name: &str, package_type: PackageType) -> Option<Package> {
        let body = self
            .port
            .info_json(&[name.to_string()], package_type)
            .await
            .map_err(|e| tracing::debug!("No info for {}: {:#}", name, e))
            .ok()?;
        let package = decode_packages(&body, package_type).ok()?.into_iter().next()?;
        let installed = self.is_package_installed(name, package_type).await;
        Some(package.set_installed(installed))
    }

    pub fn load_tap_packages_cache(&self) -> HashMap<PackageKey, Package> {
        let Some(data) = self.cache.read_file(CacheFile::TAP_PACKAGES) else {
            return HashMap::new();
        };
        match serde_json::from_slice::<Vec<Package>>(&data) {
            Ok(packages) => packages.into_iter().map(|p| (p.key(), p)).collect(),
            Err(e) => {
                tracing::debug!("Ignoring unreadable tap package cache: {}", e);
                HashMap::new()
            }
        }
    }

    pub fn save_tap_packages_to_cache(&self, packages: &[Package]) -> Result<()> {
        self.cache
            .ensure_dir()
            .context("failed to create cache directory")?;
        let data = serde_json::to_vec(packages).context("failed to encode tap packages")?;
        self.cache
            .write(CacheFile::TAP_PACKAGES.name, &data)
            .context("failed to write tap package cache")?;
        tracing::debug!("Cached {} tap packages", packages.len());
        Ok(())
    }
}

fn mark_casks_installed(mut casks: Vec<Cask>) -> Vec<Cask> {
    for cask in &mut casks {
        cask.locally_installed = true;
    }
    casks
}

fn decode_packages(body: &[u8], package_type: PackageType) -> Result<Vec<Package>> {
    Ok(match package_type {
        PackageType::Formula => serde_json::from_slice::<Vec<Formula>>(body)?
            .iter()
            .map(Package::from_formula)
            .collect(),
        PackageType::Cask => serde_json::from_slice::<CaskInfoResponse>(body)?
            .casks
            .iter()
            .map(Package::from_cask)
            .collect(),
    })
}

/// Name order; a formula sorts before a cask of the same name.
pub fn sort_packages(packages: &mut [Package]) {
    packages.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.package_type.cmp(&b.package_type))
    });
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;

    /// Offline machine with one installed formula and no prefix.
    pub(crate) struct OfflinePort;

    #[async_trait]
    impl PackageManagerPort for OfflinePort {
        async fn version(&self) -> Result<String> {
            Ok("Homebrew 4.4.0".to_string())
        }
        async fn prefix(&self) -> Result<String> {
            anyhow::bail!("no brew")
        }
        async fn installed_formulae_json(&self) -> Result<Vec<u8>> {
            Ok(br#"[{"name":"wget","versions":{"stable":"1.0"}}]"#.to_vec())
        }
        async fn installed_names(&self, _: PackageType) -> Result<Vec<String>> {
            anyhow::bail!("exit status 1")
        }
        async fn is_installed(&self, _: &str, _: PackageType) -> bool {
            false
        }
        async fn info_json(&self, _: &[String], _: PackageType) -> Result<Vec<u8>> {
            anyhow::bail!("not found")
        }
        async fn fetch_remote(&self, _: RemoteDataset) -> Result<Vec<u8>> {
            anyhow::bail!("offline")
        }
    }
}
