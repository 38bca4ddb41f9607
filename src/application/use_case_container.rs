use crate::application::package_repository::PackageRepository;
use crate::application::stream_loader::PackageStreamLoader;
use crate::application::use_cases::*;
use crate::domain::entities::AppConfig;
use crate::domain::repositories::CommandRunner;
use std::sync::Arc;

pub struct UseCaseContainer {
    pub repository: Arc<PackageRepository>,
    pub stream_loader: Arc<PackageStreamLoader>,
    pub install: Arc<InstallPackage>,
    pub update: Arc<UpdatePackage>,
    pub remove: Arc<RemovePackage>,
    pub update_all: Arc<UpdateAllPackages>,
    pub update_homebrew: Arc<UpdateHomebrew>,
    pub brewfile: Arc<BrewfileOrchestrator>,
    pub check_for_updates: Arc<CheckForUpdates>,
}

impl UseCaseContainer {
    pub fn new(
        repository: Arc<PackageRepository>,
        runner: Arc<dyn CommandRunner>,
        config: &AppConfig,
    ) -> Self {
        Self {
            stream_loader: Arc::new(PackageStreamLoader::from_config(Arc::clone(&repository), config)),
            install: Arc::new(InstallPackage::new(Arc::clone(&runner))),
            update: Arc::new(UpdatePackage::new(Arc::clone(&runner))),
            remove: Arc::new(RemovePackage::new(Arc::clone(&runner))),
            update_all: Arc::new(UpdateAllPackages::new(Arc::clone(&runner))),
            update_homebrew: Arc::new(UpdateHomebrew::new(Arc::clone(&runner))),
            brewfile: Arc::new(BrewfileOrchestrator::new(Arc::clone(&repository), Arc::clone(&runner))),
            check_for_updates: Arc::new(CheckForUpdates::new(
                repository.port(),
                config.update_check_timeout(),
            )),
            repository,
        }
    }
}
