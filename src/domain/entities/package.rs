use super::{Cask, Formula};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const LOADING_DESCRIPTION: &str = "(loading...)";
pub const UNAVAILABLE_DESCRIPTION: &str = "(unable to load package info)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackageType {
    Formula,
    Cask,
}

impl PackageType {
    pub fn from_is_cask(is_cask: bool) -> Self {
        if is_cask {
            PackageType::Cask
        } else {
            PackageType::Formula
        }
    }

    pub fn is_cask(self) -> bool {
        self == PackageType::Cask
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageType::Formula => write!(f, "Formula"),
            PackageType::Cask => write!(f, "Cask"),
        }
    }
}

/// Identity of a package: the same name may exist once as a formula and once as a cask.
pub type PackageKey = (PackageType, String);

/// Unified row model shared by formulae and casks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub homepage: String,
    pub package_type: PackageType,
    pub locally_installed: bool,
    pub outdated: bool,
    pub installed_on_request: bool,
    pub analytics_90d_rank: i64,
    pub analytics_90d_downloads: i64,
    #[serde(skip)]
    pub formula: Option<Arc<Formula>>,
    #[serde(skip)]
    pub cask: Option<Arc<Cask>>,
}

impl Package {
    pub fn new(name: String, package_type: PackageType) -> Self {
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            version: String::new(),
            homepage: String::new(),
            package_type,
            locally_installed: false,
            outdated: false,
            installed_on_request: false,
            analytics_90d_rank: 0,
            analytics_90d_downloads: 0,
            formula: None,
            cask: None,
        }
    }

    /// Row shown for a manifest entry whose metadata is not known yet.
    pub fn placeholder(name: &str, package_type: PackageType, description: &str) -> Self {
        Package::new(name.to_string(), package_type).with_description(description.to_string())
    }

    pub fn from_formula(formula: &Formula) -> Self {
        let installed_on_request = formula
            .installed
            .first()
            .map(|i| i.installed_on_request)
            .unwrap_or(false);
        let display_name = if formula.full_name.is_empty() {
            formula.name.clone()
        } else {
            formula.full_name.clone()
        };

        Self {
            name: formula.name.clone(),
            display_name,
            description: formula.desc.clone().unwrap_or_default(),
            version: formula.versions.stable.clone().unwrap_or_default(),
            homepage: formula.homepage.clone().unwrap_or_default(),
            package_type: PackageType::Formula,
            locally_installed: formula.locally_installed,
            outdated: formula.outdated,
            installed_on_request,
            analytics_90d_rank: formula.analytics_90d_rank,
            analytics_90d_downloads: formula.analytics_90d_downloads,
            formula: Some(Arc::new(formula.clone())),
            cask: None,
        }
    }

    pub fn from_cask(cask: &Cask) -> Self {
        let display_name = cask
            .name
            .first()
            .cloned()
            .unwrap_or_else(|| cask.token.clone());

        Self {
            name: cask.token.clone(),
            display_name,
            description: cask.desc.clone().unwrap_or_default(),
            version: cask.version.clone().unwrap_or_default(),
            homepage: cask.homepage.clone().unwrap_or_default(),
            package_type: PackageType::Cask,
            locally_installed: cask.locally_installed,
            outdated: cask.outdated,
            installed_on_request: false,
            analytics_90d_rank: cask.analytics_90d_rank,
            analytics_90d_downloads: cask.analytics_90d_downloads,
            formula: None,
            cask: Some(Arc::new(cask.clone())),
        }
    }

    pub fn key(&self) -> PackageKey {
        (self.package_type, self.name.clone())
    }

    pub fn is_cask(&self) -> bool {
        self.package_type.is_cask()
    }

    pub fn with_version(mut self, version: String) -> Self {
        self.version = version;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn set_installed(mut self, installed: bool) -> Self {
        self.locally_installed = installed;
        self
    }

    pub fn set_outdated(mut self, outdated: bool) -> Self {
        self.outdated = outdated;
        self
    }

    pub fn set_installed_on_request(mut self, on_request: bool) -> Self {
        self.installed_on_request = on_request;
        self
    }

    pub fn with_rank(mut self, rank: i64) -> Self {
        self.analytics_90d_rank = rank;
        self
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.package_type == other.package_type
            && self.display_name == other.display_name
            && self.description == other.description
            && self.version == other.version
            && self.homepage == other.homepage
            && self.locally_installed == other.locally_installed
            && self.outdated == other.outdated
            && self.installed_on_request == other.installed_on_request
            && self.analytics_90d_rank == other.analytics_90d_rank
            && self.analytics_90d_downloads == other.analytics_90d_downloads
    }
}
