use super::error::BrewError;
use crate::domain::entities::PackageType;
use std::process::Stdio;
use tokio::process::Command;

/// Builds and runs `brew` invocations whose output is captured rather than streamed.
#[derive(Debug, Clone)]
pub struct BrewCommand {
    program: String,
}

impl BrewCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn type_arg(package_type: PackageType) -> &'static str {
        match package_type {
            PackageType::Formula => "--formula",
            PackageType::Cask => "--cask",
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Runs to completion and returns stdout; a non-zero exit becomes [`BrewError::CommandFailed`].
    /// Dropping the future kills the child.
    pub async fn execute(&self, args: &[String]) -> Result<Vec<u8>, BrewError> {
        let command = self.describe(args);
        tracing::debug!("Running: {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BrewError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("{} failed: {}", command, stderr);
            return Err(BrewError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!("{} returned {} bytes", command, output.stdout.len());
        Ok(output.stdout)
    }

    pub async fn execute_text(&self, args: &[String]) -> Result<String, BrewError> {
        let stdout = self.execute(args).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Exit status only; spawn failures count as failure.
    pub async fn succeeds(&self, args: &[String]) -> bool {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub fn version_args() -> Vec<String> {
        vec!["--version".to_string()]
    }

    pub fn prefix_args() -> Vec<String> {
        vec!["--prefix".to_string()]
    }

    pub fn installed_info_args() -> Vec<String> {
        strings(&["info", "--json=v1", "--installed"])
    }

    pub fn list_args(package_type: PackageType) -> Vec<String> {
        strings(&["list", Self::type_arg(package_type)])
    }

    pub fn list_one_args(name: &str, package_type: PackageType) -> Vec<String> {
        strings(&["list", Self::type_arg(package_type), name])
    }

    pub fn info_args(names: &[String], package_type: PackageType) -> Vec<String> {
        let mut args = match package_type {
            PackageType::Formula => strings(&["info", "--json=v1"]),
            PackageType::Cask => strings(&["info", "--json=v2", "--cask"]),
        };
        args.extend(names.iter().cloned());
        args
    }

    pub fn tap_list_args() -> Vec<String> {
        vec!["tap".to_string()]
    }

    pub fn install_args(name: &str, package_type: PackageType) -> Vec<String> {
        match package_type {
            PackageType::Formula => strings(&["install", name]),
            PackageType::Cask => strings(&["install", "--cask", name]),
        }
    }

    pub fn uninstall_args(name: &str, package_type: PackageType) -> Vec<String> {
        match package_type {
            PackageType::Formula => strings(&["uninstall", name]),
            PackageType::Cask => strings(&["uninstall", "--cask", name]),
        }
    }

    pub fn upgrade_args(name: &str, package_type: PackageType) -> Vec<String> {
        match package_type {
            PackageType::Formula => strings(&["upgrade", name]),
            PackageType::Cask => strings(&["upgrade", "--cask", name]),
        }
    }

    pub fn upgrade_all_args() -> Vec<String> {
        vec!["upgrade".to_string()]
    }

    pub fn update_args() -> Vec<String> {
        vec!["update".to_string()]
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// Splits `brew list` / `brew tap` output into trimmed, non-empty lines.
pub fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cask_operations_carry_cask_flag() {
        assert_eq!(
            BrewCommand::install_args("firefox", PackageType::Cask),
            vec!["install", "--cask", "firefox"]
        );
        assert_eq!(
            BrewCommand::upgrade_args("wget", PackageType::Formula),
            vec!["upgrade", "wget"]
        );
        assert_eq!(
            BrewCommand::uninstall_args("firefox", PackageType::Cask),
            vec!["uninstall", "--cask", "firefox"]
        );
    }

    #[test]
    fn info_args_pick_json_version_by_type() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            BrewCommand::info_args(&names, PackageType::Formula),
            vec!["info", "--json=v1", "a", "b"]
        );
        assert_eq!(
            BrewCommand::info_args(&names, PackageType::Cask),
            vec!["info", "--json=v2", "--cask", "a", "b"]
        );
    }

    #[test]
    fn parse_lines_drops_blank_entries() {
        assert_eq!(parse_lines("wget\n\n  git \n"), vec!["wget", "git"]);
        assert!(parse_lines("").is_empty());
    }

    #[tokio::test]
    async fn failing_command_reports_stderr() {
        let sh = BrewCommand::new("sh");
        let err = sh
            .execute(&strings(&["-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            BrewError::CommandFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn abandoned_command_is_killed() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let sh = BrewCommand::new("sh");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            sh.execute(&strings(&["-c", &script])),
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
