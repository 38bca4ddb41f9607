use crate::application::{FilterEngine, PackageFilter};
use crate::domain::entities::{AppInfo, Package};
use crate::presentation::components::{FilterState, LogManager, NotificationBanner, OutputPane};
use crate::presentation::input::InputContext;

/// All state the UI thread renders. Background tasks reach it only through the draw queue.
pub struct Dashboard {
    pub info: AppInfo,
    pub filter: FilterState,
    pub output: OutputPane,
    pub banner: NotificationBanner,
    pub logs: LogManager,
    pub search_focused: bool,
    catalog: Vec<Package>,
    brewfile_packages: Vec<Package>,
    visible: Vec<Package>,
    selected: usize,
    running_tasks: usize,
    show_help: bool,
}

impl Dashboard {
    pub fn new(info: AppInfo, brewfile_mode: bool) -> Self {
        Self {
            info,
            filter: FilterState::new(brewfile_mode),
            output: OutputPane::new(),
            banner: NotificationBanner::new(),
            logs: LogManager::new(),
            search_focused: false,
            catalog: Vec::new(),
            brewfile_packages: Vec::new(),
            visible: Vec::new(),
            selected: 0,
            running_tasks: 0,
            show_help: false,
        }
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            search_focused: self.search_focused,
            brewfile_mode: self.filter.brewfile_mode(),
        }
    }

    pub fn catalog(&self) -> &[Package] {
        &self.catalog
    }

    pub fn set_catalog(&mut self, packages: Vec<Package>) {
        self.catalog = packages;
        self.refresh_visible();
    }

    pub fn brewfile_packages(&self) -> &[Package] {
        &self.brewfile_packages
    }

    pub fn set_brewfile_packages(&mut self, packages: Vec<Package>) {
        self.brewfile_packages = packages;
        self.refresh_visible();
    }

    /// Manifest-scoped list in Brewfile mode, full catalog otherwise.
    pub fn source(&self) -> &[Package] {
        if self.filter.brewfile_mode() {
            &self.brewfile_packages
        } else {
            &self.catalog
        }
    }

    pub fn refresh_visible(&mut self) {
        self.visible = FilterEngine::search(self.source(), self.filter.active(), self.filter.search_query());
        if self.selected >= self.visible.len() {
            self.selected = 0;
        }
    }

    pub fn toggle_filter(&mut self, filter: PackageFilter) {
        self.filter.toggle(filter);
        self.selected = 0;
        self.refresh_visible();
    }

    pub fn search(&mut self, query: &str) {
        self.filter.set_search_query(query);
        self.selected = 0;
        self.refresh_visible();
    }

    pub fn visible(&self) -> &[Package] {
        &self.visible
    }

    pub fn select(&mut self, index: usize) -> Option<&Package> {
        if index < self.visible.len() {
            self.selected = index;
        }
        self.selected_package()
    }

    pub fn select_by_name(&mut self, name: &str) -> Option<&Package> {
        let index = self.visible.iter().position(|p| p.name == name)?;
        self.select(index)
    }

    pub fn selected_package(&self) -> Option<&Package> {
        self.visible.get(self.selected)
    }

    pub fn begin_task(&mut self) {
        self.running_tasks += 1;
    }

    pub fn end_task(&mut self) {
        self.running_tasks = self.running_tasks.saturating_sub(1);
    }

    pub fn is_busy(&self) -> bool {
        self.running_tasks > 0
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn help_visible(&self) -> bool {
        self.show_help
    }

    pub fn header_line(&self) -> String {
        self.info.header_line()
    }

    /// `shown/total` counter next to the search field.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.visible.len(), self.source().len())
    }
}
