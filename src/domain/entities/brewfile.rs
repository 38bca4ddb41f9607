use super::PackageType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewfileEntry {
    pub name: String,
    pub is_cask: bool,
}

impl BrewfileEntry {
    pub fn new(name: impl Into<String>, is_cask: bool) -> Self {
        Self {
            name: name.into(),
            is_cask,
        }
    }

    pub fn package_type(&self) -> PackageType {
        PackageType::from_is_cask(self.is_cask)
    }
}

/// Parsed manifest. Tap order is install order; package order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewfileResult {
    pub taps: Vec<String>,
    pub packages: Vec<BrewfileEntry>,
}

impl BrewfileResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tap(&mut self, tap: String) {
        self.taps.push(tap);
    }

    pub fn add_package(&mut self, entry: BrewfileEntry) {
        self.packages.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty() && self.packages.is_empty()
    }
}
