use crate::application::package_repository::{PackageRepository, sort_packages};
use crate::domain::{
    entities::{
        BrewfileEntry, BrewfileResult, LOADING_DESCRIPTION, Package, PackageKey, PackageType,
        UNAVAILABLE_DESCRIPTION,
    },
    repositories::CommandRunner,
    services::{Notifier, OutputSink, PackageValidator},
};
use crate::infrastructure::brew::BrewCommand;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    InstallAll,
    RemoveAll,
}

impl BatchOperation {
    /// Installing an installed package or removing a missing one is a no-op.
    fn skips(self, package: &Package) -> bool {
        match self {
            BatchOperation::InstallAll => package.locally_installed,
            BatchOperation::RemoveAll => !package.locally_installed,
        }
    }

    fn skip_reason(self) -> &'static str {
        match self {
            BatchOperation::InstallAll => "already installed",
            BatchOperation::RemoveAll => "not installed",
        }
    }

    fn args(self, package: &Package) -> Vec<String> {
        match self {
            BatchOperation::InstallAll => BrewCommand::install_args(&package.name, package.package_type),
            BatchOperation::RemoveAll => BrewCommand::uninstall_args(&package.name, package.package_type),
        }
    }

    fn tag(self) -> &'static str {
        match self {
            BatchOperation::InstallAll => "INSTALL",
            BatchOperation::RemoveAll => "REMOVE",
        }
    }

    fn progressive(self) -> &'static str {
        match self {
            BatchOperation::InstallAll => "Installing",
            BatchOperation::RemoveAll => "Removing",
        }
    }

    fn past(self) -> &'static str {
        match self {
            BatchOperation::InstallAll => "installed",
            BatchOperation::RemoveAll => "removed",
        }
    }
}

/// Outcome of one batch run. `failed` keeps manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Brewfile mode: manifest parsing, tap bootstrap, manifest-scoped package list and
/// batch install/remove.
pub struct BrewfileOrchestrator {
    repository: Arc<PackageRepository>,
    runner: Arc<dyn CommandRunner>,
}

impl BrewfileOrchestrator {
    pub fn new(repository: Arc<PackageRepository>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { repository, runner }
    }

    pub fn parse(path: &Path) -> Result<BrewfileResult> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read Brewfile {}", path.display()))?;
        let result = Self::parse_str(&content);
        tracing::info!(
            "Parsed Brewfile {}: {} taps, {} packages",
            path.display(),
            result.taps.len(),
            result.packages.len()
        );
        Ok(result)
    }

    /// Understands `tap "…"`, `brew "…"` and `cask "…"`. Anything else, including
    /// entries with an unusable name, is skipped.
    pub fn parse_str(content: &str) -> BrewfileResult {
        let mut result = BrewfileResult::new();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((directive, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let Some(argument) = quoted_argument(rest) else {
                tracing::trace!("Ignoring Brewfile line without quoted argument: {}", line);
                continue;
            };

            match directive {
                "tap" if PackageValidator::validate_tap_name(argument) => {
                    result.add_tap(argument.to_string());
                }
                "brew" | "cask" if PackageValidator::validate_package_name(argument) => {
                    result.add_package(BrewfileEntry::new(argument, directive == "cask"));
                }
                _ => tracing::trace!("Ignoring Brewfile line: {}", line),
            }
        }

        result
    }

    /// Manifest-scoped list: catalog rows with live install flags, then cached tap
    /// rows, then `(loading...)` placeholders. Sorted by name.
    pub async fn resolve(&self, manifest: &BrewfileResult, catalog: &[Package]) -> Vec<Package> {
        let installed_casks = self.repository.installed_cask_names().await;
        let installed_formulae = self.repository.installed_formula_names().await;

        let catalog: HashMap<PackageKey, &Package> = catalog.iter().map(|p| (p.key(), p)).collect();
        let mut tap_cache: Option<HashMap<PackageKey, Package>> = None;
        let mut seen: HashSet<PackageKey> = HashSet::new();
        let mut resolved = Vec::with_capacity(manifest.packages.len());

        for entry in &manifest.packages {
            let key = (entry.package_type(), entry.name.clone());
            if !seen.insert(key.clone()) {
                continue;
            }

            if let Some(package) = catalog.get(&key) {
                let installed = match entry.package_type() {
                    PackageType::Cask => installed_casks.contains(&entry.name),
                    PackageType::Formula => installed_formulae.contains(&entry.name),
                };
                resolved.push((*package).clone().set_installed(installed));
                continue;
            }

            let cached = tap_cache
                .get_or_insert_with(|| self.repository.load_tap_packages_cache())
                .get(&key)
                .cloned();
            match cached {
                Some(package) => {
                    let installed = self
                        .repository
                        .is_package_installed(&entry.name, entry.package_type())
                        .await;
                    resolved.push(package.set_installed(installed));
                }
                None => resolved.push(Package::placeholder(
                    &entry.name,
                    entry.package_type(),
                    LOADING_DESCRIPTION,
                )),
            }
        }

        sort_packages(&mut resolved);
        tracing::debug!("Resolved {} Brewfile packages", resolved.len());
        resolved
    }

    /// Looks up manifest packages the catalog does not know (typically from third-party
    /// taps), persists every manifest package for the next start and returns the rows
    /// to append to the catalog. Failed lookups become `(unable to load package info)` rows.
    pub async fn fetch_tap_packages(&self, manifest: &BrewfileResult, catalog: &[Package]) -> Vec<Package> {
        if manifest.taps.is_empty() {
            return Vec::new();
        }

        let existing: HashMap<PackageKey, &Package> = catalog.iter().map(|p| (p.key(), p)).collect();
        let mut to_cache: Vec<Package> = Vec::new();
        let mut missing_casks: Vec<String> = Vec::new();
        let mut missing_formulae: Vec<String> = Vec::new();

        for entry in &manifest.packages {
            match existing.get(&(entry.package_type(), entry.name.clone())) {
                Some(package) => to_cache.push((*package).clone()),
                None if entry.is_cask => missing_casks.push(entry.name.clone()),
                None => missing_formulae.push(entry.name.clone()),
            }
        }

        let mut fetched = Vec::new();
        for (names, package_type) in [
            (missing_casks, PackageType::Cask),
            (missing_formulae, PackageType::Formula),
        ] {
            if names.is_empty() {
                continue;
            }
            let mut info = self.repository.get_packages_info(&names, package_type).await;
            for name in names {
                let package = info.remove(&name).unwrap_or_else(|| {
                    tracing::warn!("No package info for {} {}", package_type, name);
                    Package::placeholder(&name, package_type, UNAVAILABLE_DESCRIPTION)
                });
                fetched.push(package);
            }
        }

        to_cache.extend(fetched.iter().cloned());
        if !to_cache.is_empty() {
            if let Err(e) = self.repository.save_tap_packages_to_cache(&to_cache) {
                tracing::warn!("Could not cache tap packages: {:#}", e);
            }
        }

        tracing::info!("Fetched {} tap packages", fetched.len());
        fetched
    }

    /// Installs taps that are not present yet, one after another. A failing tap is
    /// reported and the next one is still attempted. Returns how many were installed.
    pub async fn install_missing_taps(
        &self,
        taps: &[String],
        sink: Arc<dyn OutputSink>,
        notifier: &dyn Notifier,
    ) -> usize {
        let mut missing = Vec::new();
        for tap in taps {
            if !self.runner.is_tap_installed(tap).await {
                missing.push(tap.as_str());
            }
        }
        if missing.is_empty() {
            tracing::debug!("All Brewfile taps already installed");
            return 0;
        }

        let mut installed = 0;
        for tap in missing {
            notifier.warning(&format!("Installing tap {}...", tap));
            sink.line(&format!("[TAP] Installing {}...", tap));

            match self.runner.run_tap(tap, Arc::clone(&sink)).await {
                Ok(()) => {
                    installed += 1;
                    notifier.success(&format!("Tap {} installed", tap));
                    sink.line(&format!("[SUCCESS] tap {} installed", tap));
                }
                Err(e) => {
                    tracing::error!("Failed to install tap {}: {:#}", tap, e);
                    notifier.error(&format!("Failed to install tap {}", tap));
                    sink.line(&format!("[ERROR] Failed to install tap {}", tap));
                }
            }
        }

        notifier.success("All taps installed");
        installed
    }

    /// Runs `operation` over `packages` sequentially. A failing package is reported to
    /// the sink and never stops the batch.
    pub async fn batch_apply(
        &self,
        operation: BatchOperation,
        packages: &[Package],
        sink: Arc<dyn OutputSink>,
        notifier: &dyn Notifier,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = packages.len();

        for (index, package) in packages.iter().enumerate() {
            let position = index + 1;
            if operation.skips(package) {
                summary.skipped += 1;
                sink.line(&format!("[SKIP] {} ({})", package.name, operation.skip_reason()));
                continue;
            }

            summary.attempted += 1;
            notifier.warning(&format!(
                "{} {} ({}/{})...",
                operation.progressive(),
                package.name,
                position,
                total
            ));
            sink.line(&format!(
                "\n[{}] {} {}...",
                operation.tag(),
                operation.progressive(),
                package.name
            ));

            match self.runner.run(&operation.args(package), Arc::clone(&sink)).await {
                Ok(()) => {
                    summary.succeeded += 1;
                    sink.line(&format!("[SUCCESS] {} {} successfully", package.name, operation.past()));
                }
                Err(e) => {
                    tracing::warn!("{} {} failed: {:#}", operation.progressive(), package.name, e);
                    summary.failed.push(package.name.clone());
                    sink.line(&format!(
                        "[ERROR] Failed to {} {}: {:#}",
                        operation.tag().to_lowercase(),
                        package.name,
                        e
                    ));
                }
            }
        }

        let message = format!(
            "{} {} of {} packages ({} skipped, {} failed)",
            capitalize(operation.past()),
            summary.succeeded,
            total,
            summary.skipped,
            summary.failed.len()
        );
        if summary.is_success() {
            notifier.success(&message);
        } else {
            notifier.error(&message);
        }
        tracing::info!("{}", message);
        summary
    }
}

/// First double-quoted string in `rest`, e.g. `"wget", args: [...]` gives `wget`.
fn quoted_argument(rest: &str) -> Option<&str> {
    let start = rest.find('"')? + 1;
    let len = rest[start..].find('"')?;
    let argument = &rest[start..start + len];
    (!argument.is_empty()).then_some(argument)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_taps_and_packages_in_order() {
        let result = BrewfileOrchestrator::parse_str(
            "tap \"foo/bar\"\nbrew \"wget\"\ncask \"firefox\"\n# comment\n",
        );
        assert_eq!(result.taps, vec!["foo/bar"]);
        assert_eq!(
            result.packages,
            vec![BrewfileEntry::new("wget", false), BrewfileEntry::new("firefox", true)]
        );
    }

    #[test]
    fn options_after_name_are_ignored() {
        let result = BrewfileOrchestrator::parse_str(
            "brew \"postgresql@16\", restart_service: true, args: [\"with-icu\"]\n",
        );
        assert_eq!(result.packages, vec![BrewfileEntry::new("postgresql@16", false)]);
    }

    #[test]
    fn malformed_lines_are_dropped_silently() {
        let result = BrewfileOrchestrator::parse_str(
            "brew wget\nbrew \"\"\nmas \"Xcode\", id: 497799835\ncask \"--force\"\ntap \"solo\"\nbrewery \"x\"\n",
        );
        assert!(result.is_empty());
    }

    #[test]
    fn parse_reports_missing_file() {
        let err = BrewfileOrchestrator::parse(Path::new("/nonexistent/Brewfile")).unwrap_err();
        assert!(err.to_string().contains("failed to read Brewfile"));
    }

    #[test]
    fn skip_predicates_follow_install_state() {
        let installed = Package::new("wget".to_string(), PackageType::Formula).set_installed(true);
        let missing = Package::new("git".to_string(), PackageType::Formula);
        assert!(BatchOperation::InstallAll.skips(&installed));
        assert!(!BatchOperation::InstallAll.skips(&missing));
        assert!(BatchOperation::RemoveAll.skips(&missing));
        assert_eq!(
            BatchOperation::RemoveAll.args(&installed),
            vec!["uninstall", "wget"]
        );
    }
}
