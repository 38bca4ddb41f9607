pub mod analytics;
pub mod app_info;
pub mod brewfile;
pub mod cask;
pub mod config;
pub mod formula;
pub mod package;

pub use analytics::{Analytics, AnalyticsItem};
pub use app_info::AppInfo;
pub use brewfile::{BrewfileEntry, BrewfileResult};
pub use cask::{Cask, CaskInfoResponse};
pub use config::AppConfig;
pub use formula::Formula;
pub use package::{
    LOADING_DESCRIPTION, Package, PackageKey, PackageType, UNAVAILABLE_DESCRIPTION,
};
