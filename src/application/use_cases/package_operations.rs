use crate::domain::{
    entities::Package,
    repositories::CommandRunner,
    services::{Notifier, OutputSink, PackageValidator},
};
use crate::infrastructure::brew::BrewCommand;
use anyhow::{Result, bail};
use std::sync::Arc;

/// Messages for one streamed command.
struct Operation<'a> {
    args: Vec<String>,
    running: String,
    done: String,
    failed: String,
    tag: &'a str,
}

async fn run_operation(
    runner: &dyn CommandRunner,
    operation: Operation<'_>,
    sink: Arc<dyn OutputSink>,
    notifier: &dyn Notifier,
) -> Result<()> {
    notifier.warning(&operation.running);
    sink.line(&format!("\n[{}] {}", operation.tag, operation.running));

    match runner.run(&operation.args, Arc::clone(&sink)).await {
        Ok(()) => {
            notifier.success(&operation.done);
            sink.line(&format!("[SUCCESS] {}", operation.done));
            Ok(())
        }
        Err(e) => {
            tracing::error!("{}: {:#}", operation.failed, e);
            notifier.error(&operation.failed);
            sink.line(&format!("[ERROR] {}: {:#}", operation.failed, e));
            Err(e)
        }
    }
}

fn checked_name(package: &Package) -> Result<&str> {
    if !PackageValidator::validate_package_name(&package.name) {
        bail!("invalid package name '{}'", package.name);
    }
    Ok(&package.name)
}

pub struct InstallPackage {
    runner: Arc<dyn CommandRunner>,
}

impl InstallPackage {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(
        &self,
        package: &Package,
        sink: Arc<dyn OutputSink>,
        notifier: &dyn Notifier,
    ) -> Result<()> {
        let name = checked_name(package)?;
        let operation = Operation {
            args: BrewCommand::install_args(name, package.package_type),
            running: format!("Installing {}...", name),
            done: format!("{} installed successfully", name),
            failed: format!("Failed to install {}", name),
            tag: "INSTALL",
        };
        run_operation(self.runner.as_ref(), operation, sink, notifier).await
    }
}

pub struct UpdatePackage {
    runner: Arc<dyn CommandRunner>,
}

impl UpdatePackage {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(
        &self,
        package: &Package,
        sink: Arc<dyn OutputSink>,
        notifier: &dyn Notifier,
    ) -> Result<()> {
        let name = checked_name(package)?;
        let operation = Operation {
            args: BrewCommand::upgrade_args(name, package.package_type),
            running: format!("Updating {}...", name),
            done: format!("{} updated successfully", name),
            failed: format!("Failed to update {}", name),
            tag: "UPDATE",
        };
        run_operation(self.runner.as_ref(), operation, sink, notifier).await
    }
}

pub struct RemovePackage {
    runner: Arc<dyn CommandRunner>,
}

impl RemovePackage {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(
        &self,
        package: &Package,
        sink: Arc<dyn OutputSink>,
        notifier: &dyn Notifier,
    ) -> Result<()> {
        let name = checked_name(package)?;
        let operation = Operation {
            args: BrewCommand::uninstall_args(name, package.package_type),
            running: format!("Removing {}...", name),
            done: format!("{} removed successfully", name),
            failed: format!("Failed to remove {}", name),
            tag: "REMOVE",
        };
        run_operation(self.runner.as_ref(), operation, sink, notifier).await
    }
}

/// `brew upgrade` for every outdated package.
pub struct UpdateAllPackages {
    runner: Arc<dyn CommandRunner>,
}

impl UpdateAllPackages {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(&self, sink: Arc<dyn OutputSink>, notifier: &dyn Notifier) -> Result<()> {
        let operation = Operation {
            args: BrewCommand::upgrade_all_args(),
            running: "Updating all packages...".to_string(),
            done: "All packages updated".to_string(),
            failed: "Failed to update all packages".to_string(),
            tag: "UPDATE",
        };
        run_operation(self.runner.as_ref(), operation, sink, notifier).await
    }
}

/// `brew update`: refreshes the package manager and its taps.
pub struct UpdateHomebrew {
    runner: Arc<dyn CommandRunner>,
}

impl UpdateHomebrew {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(&self, sink: Arc<dyn OutputSink>, notifier: &dyn Notifier) -> Result<()> {
        let operation = Operation {
            args: BrewCommand::update_args(),
            running: "Updating Homebrew formulae...".to_string(),
            done: "Homebrew formulae updated".to_string(),
            failed: "Could not update Homebrew formulae".to_string(),
            tag: "UPDATE",
        };
        run_operation(self.runner.as_ref(), operation, sink, notifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PackageType;
    use crate::domain::services::{NotificationLevel, OutputStream};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<Vec<String>>>,
        lines: Mutex<String>,
        notes: Mutex<Vec<NotificationLevel>>,
        fail: bool,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, args: &[String], _sink: Arc<dyn OutputSink>) -> Result<()> {
            self.commands.lock().unwrap().push(args.to_vec());
            if self.fail {
                bail!("exit status: 1");
            }
            Ok(())
        }

        async fn is_tap_installed(&self, _tap: &str) -> bool {
            true
        }
    }

    impl OutputSink for Recorder {
        fn append(&self, _stream: OutputStream, text: &str) {
            self.lines.lock().unwrap().push_str(text);
        }

        fn scroll_to_end(&self) {}
    }

    impl Notifier for Recorder {
        fn notify(&self, level: NotificationLevel, _message: &str) {
            self.notes.lock().unwrap().push(level);
        }
    }

    #[tokio::test]
    async fn cask_install_passes_cask_flag() {
        let recorder = Arc::new(Recorder::default());
        let package = Package::new("firefox".to_string(), PackageType::Cask);

        InstallPackage::new(recorder.clone())
            .execute(&package, recorder.clone(), recorder.as_ref())
            .await
            .unwrap();

        assert_eq!(
            recorder.commands.lock().unwrap()[0],
            vec!["install", "--cask", "firefox"]
        );
        assert_eq!(
            *recorder.notes.lock().unwrap(),
            vec![NotificationLevel::Warning, NotificationLevel::Success]
        );
    }

    #[tokio::test]
    async fn failure_is_reported_and_returned() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let package = Package::new("wget".to_string(), PackageType::Formula);

        let result = RemovePackage::new(recorder.clone())
            .execute(&package, recorder.clone(), recorder.as_ref())
            .await;

        assert!(result.is_err());
        assert!(recorder.lines.lock().unwrap().contains("[ERROR] Failed to remove wget"));
        assert_eq!(
            recorder.notes.lock().unwrap().last(),
            Some(&NotificationLevel::Error)
        );
    }

    #[tokio::test]
    async fn flag_like_names_never_reach_the_runner() {
        let recorder = Arc::new(Recorder::default());
        let package = Package::new("--force".to_string(), PackageType::Formula);

        let result = UpdatePackage::new(recorder.clone())
            .execute(&package, recorder.clone(), recorder.as_ref())
            .await;

        assert!(result.is_err());
        assert!(recorder.commands.lock().unwrap().is_empty());
    }
}
