use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Formula record as emitted by `brew info --json=v1` and the remote catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub tap: Option<String>,
    #[serde(default)]
    pub oldnames: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub bottle: Bottle,
    #[serde(default)]
    pub keg_only: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub build_dependencies: Vec<String>,
    #[serde(default)]
    pub caveats: Option<String>,
    #[serde(default)]
    pub installed: Vec<Installed>,
    #[serde(default)]
    pub linked_keg: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub disabled: bool,

    #[serde(skip)]
    pub locally_installed: bool,
    #[serde(skip)]
    pub local_path: Option<String>,
    #[serde(skip)]
    pub analytics_90d_rank: i64,
    #[serde(skip)]
    pub analytics_90d_downloads: i64,
}

impl Formula {
    pub fn installed_version(&self) -> Option<&str> {
        self.installed.first().map(|i| i.version.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub stable: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub bottle: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bottle {
    #[serde(default)]
    pub stable: Option<BottleStable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BottleStable {
    #[serde(default)]
    pub rebuild: u32,
    #[serde(default)]
    pub root_url: Option<String>,
    #[serde(default)]
    pub files: HashMap<String, BottleFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BottleFile {
    #[serde(default)]
    pub cellar: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Installed {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub built_as_bottle: bool,
    #[serde(default)]
    pub poured_from_bottle: bool,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub runtime_dependencies: Vec<RuntimeDependency>,
    #[serde(default)]
    pub installed_as_dependency: bool,
    #[serde(default)]
    pub installed_on_request: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeDependency {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub pkg_version: String,
    #[serde(default)]
    pub declared_directly: bool,
}
