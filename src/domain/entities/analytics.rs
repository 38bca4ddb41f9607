use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub items: Vec<AnalyticsItem>,
}

/// One popularity sample. Formula payloads fill `formula`, cask payloads fill `cask`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsItem {
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub cask: String,
    #[serde(default)]
    pub count: String,
}

impl AnalyticsItem {
    /// Download count with thousands separators stripped; unparsable counts read as zero.
    pub fn downloads(&self) -> i64 {
        self.count.replace(',', "").trim().parse().unwrap_or(0)
    }
}

impl Analytics {
    pub fn by_formula(self) -> HashMap<String, AnalyticsItem> {
        self.items
            .into_iter()
            .map(|item| (item.formula.clone(), item))
            .collect()
    }

    pub fn by_cask(self) -> HashMap<String, AnalyticsItem> {
        self.items
            .into_iter()
            .filter(|item| !item.cask.is_empty())
            .map(|item| (item.cask.clone(), item))
            .collect()
    }
}
