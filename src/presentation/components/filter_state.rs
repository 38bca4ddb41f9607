use crate::application::PackageFilter;

/// Search box and filter toggles. Structural filters are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    active: Option<PackageFilter>,
    brewfile_mode: bool,
    search_query: String,
}

impl FilterState {
    pub fn new(brewfile_mode: bool) -> Self {
        Self {
            brewfile_mode,
            ..Default::default()
        }
    }

    pub fn active(&self) -> Option<PackageFilter> {
        self.active
    }

    pub fn is_active(&self, filter: PackageFilter) -> bool {
        self.active == Some(filter)
    }

    /// Activates `filter`, replacing any other one; toggling the active filter clears it.
    pub fn toggle(&mut self, filter: PackageFilter) {
        self.active = if self.active == Some(filter) {
            None
        } else {
            Some(filter)
        };
    }

    pub fn brewfile_mode(&self) -> bool {
        self.brewfile_mode
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn label(&self) -> String {
        match (self.brewfile_mode, self.active) {
            (true, Some(filter)) => format!("Search (Brewfile - {}): ", filter),
            (true, None) => "Search (Brewfile): ".to_string(),
            (false, Some(filter)) => format!("Search ({}): ", filter),
            (false, None) => "Search (All): ".to_string(),
        }
    }
}
