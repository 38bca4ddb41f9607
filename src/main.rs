use anyhow::{Context, Result, bail};
use boldbrew::application::{PackageFilter, PackageRepository, UseCaseContainer};
use boldbrew::domain::repositories::{CommandRunner, PackageManagerPort};
use boldbrew::infrastructure::brew::{BrewPackageManager, CommandExecutor};
use boldbrew::infrastructure::{Cache, ConfigRepository};
use boldbrew::presentation::input::{Action, Key};
use boldbrew::presentation::services::log_capture::init_log_capture;
use boldbrew::presentation::services::{AsyncExecutor, DrawLoop, DrawQueue};
use boldbrew::presentation::ui::{AppService, Dashboard};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "bbrew", version, about = "Homebrew package dashboard")]
struct Cli {
    /// Scope the dashboard to the packages of a Brewfile
    #[arg(short = 'f', long, value_name = "PATH")]
    brewfile: Option<PathBuf>,

    /// Run `brew update` first and ignore cached data
    #[arg(long)]
    refresh: bool,

    /// installed, outdated, leaves or casks
    #[arg(long)]
    filter: Option<PackageFilter>,

    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Select a package by name before replaying keys
    #[arg(long, value_name = "NAME")]
    select: Option<String>,

    /// Key slugs replayed after loading, e.g. `/,w,g,e,t,esc`
    #[arg(long, value_delimiter = ',', value_name = "KEYS")]
    keys: Vec<String>,

    /// Install every Brewfile package that is not installed yet
    #[arg(long, requires = "brewfile", conflicts_with = "remove_all")]
    install_all: bool,

    /// Remove every installed Brewfile package
    #[arg(long, requires = "brewfile")]
    remove_all: bool,

    /// Look for a newer bbrew release
    #[arg(long)]
    check_update: bool,

    /// Print captured logs to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Writes streamed command output as soon as it is applied.
fn echo<W: Write>(out: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .context("failed to write command output")
}

/// Applies queued updates until no background task is running, echoing command output.
fn settle(
    draw_loop: &DrawLoop,
    dashboard: &mut Dashboard,
    logs: Option<&Receiver<String>>,
    verbose: bool,
) -> Result<()> {
    loop {
        if draw_loop.wait(dashboard, FRAME).is_none() {
            break;
        }

        echo(&mut std::io::stdout().lock(), &dashboard.output.take_unprinted())?;

        if let Some(receiver) = logs {
            let received = dashboard.logs.drain(receiver);
            if verbose && received > 0 {
                for line in dashboard.logs.recent(received) {
                    eprintln!("{}", line);
                }
            }
        }

        if !dashboard.is_busy() {
            break;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let logs = init_log_capture(cli.verbose);

    let config = ConfigRepository::new().load()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let port: Arc<dyn PackageManagerPort> = Arc::new(BrewPackageManager::from_config(&config)?);
    let runner: Arc<dyn CommandRunner> = Arc::new(CommandExecutor::with_program(&config.brew_path));
    let repository = Arc::new(PackageRepository::new(port, Cache::new(config.resolved_cache_dir())));
    let use_cases = Arc::new(UseCaseContainer::new(repository, runner, &config));

    let executor = AsyncExecutor::new()?;
    let (queue, draw_loop) = DrawQueue::channel();
    let app = AppService::new(use_cases, executor, queue, cli.brewfile.as_deref())
        .context("failed to start dashboard")?;
    let mut dashboard = app.create_dashboard();

    if cli.refresh {
        app.update_homebrew(&mut dashboard);
        settle(&draw_loop, &mut dashboard, logs.as_ref(), cli.verbose)?;
    }
    app.boot(&mut dashboard, cli.refresh);
    if cli.check_update {
        app.check_for_updates(&mut dashboard);
    }
    settle(&draw_loop, &mut dashboard, logs.as_ref(), cli.verbose)?;

    if let Some(filter) = cli.filter {
        app.perform(&mut dashboard, Action::ToggleFilter(filter));
    }
    if let Some(query) = &cli.search {
        dashboard.search(query);
    }
    if let Some(name) = &cli.select {
        if dashboard.select_by_name(name).is_none() {
            bail!("no visible package named '{}'", name);
        }
    }

    for slug in &cli.keys {
        let Some(key) = Key::parse(slug) else {
            bail!("unknown key '{}'", slug);
        };
        let keep_running = app.handle_key(&mut dashboard, key);
        settle(&draw_loop, &mut dashboard, logs.as_ref(), cli.verbose)?;
        if !keep_running {
            return Ok(());
        }
    }

    if cli.install_all || cli.remove_all {
        let action = if cli.install_all { Action::InstallAll } else { Action::RemoveAll };
        app.perform(&mut dashboard, action);
        settle(&draw_loop, &mut dashboard, logs.as_ref(), cli.verbose)?;
    }

    println!("{}", app.render(&dashboard));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn echo_reports_write_failures() {
        let err = echo(&mut Closed, "==> Installing wget\n").unwrap_err();
        assert!(format!("{:#}", err).contains("failed to write command output"));
    }

    #[test]
    fn echo_skips_empty_output() {
        assert!(echo(&mut Closed, "").is_ok());

        let mut out = Vec::new();
        echo(&mut out, "done\n").unwrap();
        assert_eq!(out, b"done\n");
    }
}
