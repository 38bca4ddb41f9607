/// Banner data handed to the header instead of process-wide mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub brew_version: String,
    pub latest_version: Option<String>,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            brew_version: "-".to_string(),
            latest_version: None,
        }
    }

    pub fn current() -> Self {
        Self::new("Bold Brew", env!("CARGO_PKG_VERSION"))
    }

    pub fn with_brew_version(mut self, brew_version: String) -> Self {
        self.brew_version = brew_version;
        self
    }

    pub fn with_latest_version(mut self, latest: Option<String>) -> Self {
        self.latest_version = latest;
        self
    }

    pub fn header_line(&self) -> String {
        match &self.latest_version {
            Some(latest) if latest != &self.version => format!(
                "{} {} (New Version Available: {}) | {}",
                self.name, self.version, latest, self.brew_version
            ),
            _ => format!("{} {} | {}", self.name, self.version, self.brew_version),
        }
    }
}
