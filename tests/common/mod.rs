//! Shared fakes for integration tests: a scripted package manager, a recording command
//! runner and a sink/notifier pair that keeps everything it is handed.
#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use boldbrew::application::PackageRepository;
use boldbrew::domain::entities::PackageType;
use boldbrew::domain::repositories::{CommandRunner, PackageManagerPort, RemoteDataset};
use boldbrew::domain::services::{NotificationLevel, Notifier, OutputSink, OutputStream};
use boldbrew::infrastructure::Cache;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Pads a JSON document with trailing whitespace so it clears every cache size floor.
pub fn padded(value: &Value) -> Vec<u8> {
    let mut body = serde_json::to_vec(value).unwrap();
    if body.len() < 1024 {
        body.resize(1024, b' ');
    }
    body
}

pub fn formula(name: &str, desc: &str, version: &str) -> Value {
    json!({
        "name": name,
        "full_name": name,
        "desc": desc,
        "versions": { "stable": version }
    })
}

pub fn installed_formula(name: &str, version: &str, on_request: bool, outdated: bool) -> Value {
    json!({
        "name": name,
        "full_name": name,
        "desc": format!("{} (installed)", name),
        "versions": { "stable": version },
        "installed": [{ "version": version, "installed_on_request": on_request }],
        "outdated": outdated
    })
}

pub fn cask(token: &str, desc: &str, version: &str) -> Value {
    json!({
        "token": token,
        "full_token": token,
        "name": [token],
        "desc": desc,
        "version": version
    })
}

pub fn formula_rank(name: &str, number: i64) -> Value {
    json!({ "number": number, "formula": name, "count": "1,000" })
}

pub fn cask_rank(token: &str, number: i64) -> Value {
    json!({ "number": number, "cask": token, "count": "500" })
}

/// Scripted [`PackageManagerPort`]. Every remote fetch is counted.
pub struct FakePort {
    pub version: Option<String>,
    pub formulae: Value,
    pub casks: Value,
    pub formula_analytics: Value,
    pub cask_analytics: Value,
    pub installed_formulae: Value,
    pub installed_casks: Vec<String>,
    /// `brew info` answers, keyed by type and name. Unknown names fail the whole call.
    pub info: HashMap<(PackageType, String), Value>,
    pub failing: Mutex<HashSet<RemoteDataset>>,
    pub fetch_delay: Option<Duration>,
    pub info_delay: Option<Duration>,
    pub fetches: Mutex<HashMap<RemoteDataset, usize>>,
    pub info_calls: Mutex<Vec<Vec<String>>>,
}

impl Default for FakePort {
    fn default() -> Self {
        Self {
            version: Some("Homebrew 4.4.0".to_string()),
            formulae: json!([]),
            casks: json!([]),
            formula_analytics: json!({ "items": [] }),
            cask_analytics: json!({ "items": [] }),
            installed_formulae: json!([]),
            installed_casks: Vec::new(),
            info: HashMap::new(),
            failing: Mutex::new(HashSet::new()),
            fetch_delay: None,
            info_delay: None,
            fetches: Mutex::new(HashMap::new()),
            info_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakePort {
    /// wget and git remote, git installed and outdated, firefox as a remote cask,
    /// analytics ranking git above wget.
    pub fn catalog() -> Self {
        Self {
            formulae: json!([
                formula("wget", "Internet file retriever", "1.24.5"),
                formula("git", "Distributed revision control system", "2.47.0"),
            ]),
            casks: json!([cask("firefox", "Web browser", "131.0")]),
            formula_analytics: json!({ "items": [formula_rank("git", 1), formula_rank("wget", 2)] }),
            cask_analytics: json!({ "items": [cask_rank("firefox", 1)] }),
            installed_formulae: json!([installed_formula("git", "2.46.0", true, true)]),
            ..Default::default()
        }
    }

    pub fn with_info(mut self, package_type: PackageType, name: &str, value: Value) -> Self {
        self.info.insert((package_type, name.to_string()), value);
        self
    }

    pub fn fail(&self, dataset: RemoteDataset) {
        self.failing.lock().unwrap().insert(dataset);
    }

    pub fn recover(&self, dataset: RemoteDataset) {
        self.failing.lock().unwrap().remove(&dataset);
    }

    pub fn fetch_count(&self, dataset: RemoteDataset) -> usize {
        self.fetches.lock().unwrap().get(&dataset).copied().unwrap_or(0)
    }

    fn installed_formula_names(&self) -> Vec<String> {
        self.installed_formulae
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl PackageManagerPort for FakePort {
    async fn version(&self) -> Result<String> {
        self.version.clone().ok_or_else(|| anyhow!("brew not found"))
    }

    async fn prefix(&self) -> Result<String> {
        Ok("/opt/homebrew".to_string())
    }

    async fn installed_formulae_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.installed_formulae)?)
    }

    async fn installed_names(&self, package_type: PackageType) -> Result<Vec<String>> {
        match package_type {
            PackageType::Formula => Ok(self.installed_formula_names()),
            PackageType::Cask if self.installed_casks.is_empty() => bail!("no casks installed"),
            PackageType::Cask => Ok(self.installed_casks.clone()),
        }
    }

    async fn is_installed(&self, name: &str, package_type: PackageType) -> bool {
        self.installed_names(package_type)
            .await
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    async fn info_json(&self, names: &[String], package_type: PackageType) -> Result<Vec<u8>> {
        self.info_calls.lock().unwrap().push(names.to_vec());
        if let Some(delay) = self.info_delay {
            tokio::time::sleep(delay).await;
        }
        let mut found = Vec::new();
        for name in names {
            match self.info.get(&(package_type, name.clone())) {
                Some(value) => found.push(value.clone()),
                None => bail!("No available formula or cask with the name \"{}\"", name),
            }
        }
        let body = match package_type {
            PackageType::Formula => Value::Array(found),
            PackageType::Cask => json!({ "formulae": [], "casks": found }),
        };
        Ok(serde_json::to_vec(&body)?)
    }

    async fn fetch_remote(&self, dataset: RemoteDataset) -> Result<Vec<u8>> {
        *self.fetches.lock().unwrap().entry(dataset).or_default() += 1;
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&dataset) {
            bail!("503 Service Unavailable for {}", dataset.path());
        }
        let value = match dataset {
            RemoteDataset::Formulae => &self.formulae,
            RemoteDataset::Casks => &self.casks,
            RemoteDataset::FormulaAnalytics => &self.formula_analytics,
            RemoteDataset::CaskAnalytics => &self.cask_analytics,
        };
        Ok(padded(value))
    }
}

/// Records every command; fails the ones whose last argument is in `fail_on`.
#[derive(Default)]
pub struct FakeRunner {
    pub fail_on: HashSet<String>,
    pub installed_taps: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail_on: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, args: &[String], sink: Arc<dyn OutputSink>) -> Result<()> {
        self.calls.lock().unwrap().push(args.to_vec());
        let target = args.last().cloned().unwrap_or_default();
        if self.fail_on.contains(&target) {
            sink.append(OutputStream::Stderr, &format!("Error: {} failed\n", target));
            bail!("`brew {}` exited with exit status: 1", args.join(" "));
        }
        if args.first().map(String::as_str) == Some("tap") {
            self.installed_taps.lock().unwrap().insert(target.clone());
        }
        sink.line(&format!("==> brew {}", args.join(" ")));
        Ok(())
    }

    async fn is_tap_installed(&self, tap: &str) -> bool {
        self.installed_taps.lock().unwrap().contains(tap)
    }
}

/// Keeps all output and notifications.
#[derive(Default)]
pub struct Recorder {
    pub output: Mutex<String>,
    pub notes: Mutex<Vec<(NotificationLevel, String)>>,
}

impl Recorder {
    pub fn output(&self) -> String {
        self.output.lock().unwrap().clone()
    }

    pub fn last_note(&self) -> Option<(NotificationLevel, String)> {
        self.notes.lock().unwrap().last().cloned()
    }
}

impl OutputSink for Recorder {
    fn append(&self, _stream: OutputStream, text: &str) {
        self.output.lock().unwrap().push_str(text);
    }

    fn scroll_to_end(&self) {}
}

impl Notifier for Recorder {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notes.lock().unwrap().push((level, message.to_string()));
    }
}

/// Repository over `port` with its cache in a fresh temporary directory.
pub fn repository(port: Arc<FakePort>) -> (Arc<PackageRepository>, TempDir) {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(dir.path().join("cache"));
    (Arc::new(PackageRepository::new(port, cache)), dir)
}
