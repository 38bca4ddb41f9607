use crate::application::UseCaseContainer;
use crate::application::package_repository::sort_packages;
use crate::application::use_cases::{BatchOperation, BrewfileOrchestrator};
use crate::domain::entities::{AppInfo, BrewfileResult, Package};
use crate::domain::services::{Notifier, OutputSink};
use crate::presentation::input::{Action, Key, Keymap};
use crate::presentation::services::{
    AsyncExecutor, DrawQueue, QueuedNotifier, QueuedOutput, QueuedStreamObserver,
};
use crate::presentation::ui::Dashboard;
use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Everything a background task needs; cheap to clone into `async move` blocks.
#[derive(Clone)]
struct TaskContext {
    use_cases: Arc<UseCaseContainer>,
    queue: DrawQueue,
    manifest: Option<Arc<BrewfileResult>>,
}

impl TaskContext {
    fn sink(&self) -> Arc<dyn OutputSink> {
        Arc::new(QueuedOutput::new(self.queue.clone()))
    }

    fn notifier(&self) -> QueuedNotifier {
        QueuedNotifier::new(self.queue.clone())
    }

    async fn install_taps(&self) {
        let Some(manifest) = &self.manifest else {
            return;
        };
        self.use_cases
            .brewfile
            .install_missing_taps(&manifest.taps, self.sink(), &self.notifier())
            .await;
    }

    async fn query_version(&self) {
        match self.use_cases.repository.version().await {
            Ok(version) => self.queue.queue_update_draw(move |d| {
                d.info = d.info.clone().with_brew_version(version);
            }),
            Err(e) => {
                tracing::error!("{:#}", e);
                self.notifier().error("Could not determine Homebrew version");
            }
        }
    }

    async fn check_for_updates(&self) {
        let current = AppInfo::current().version;
        let latest = self.use_cases.check_for_updates.execute(&current).await;
        if latest.is_some() {
            self.queue.queue_update_draw(move |d| {
                d.info = d.info.clone().with_latest_version(latest);
            });
        }
    }

    /// Streams a full load into the catalog, then publishes the final lists.
    async fn load(&self, force_download: bool) {
        self.notifier().warning("Loading packages...");
        let loader = &self.use_cases.stream_loader;
        let (packages, errors) = loader.stream(force_download);
        let mut observer = QueuedStreamObserver::new(self.queue.clone());
        loader.ingest(packages, errors, &mut observer).await;
        self.publish_catalog().await;
    }

    /// Re-reads installed state after a command changed it.
    async fn after_operation(&self) {
        if let Err(e) = self.use_cases.repository.reload_installed().await {
            tracing::error!("{:#}", e);
            self.notifier().error("Could not refresh installed packages");
        }
        self.publish_catalog().await;
    }

    async fn publish_catalog(&self) {
        let mut catalog = self.use_cases.repository.get_packages();
        let Some(manifest) = self.manifest.clone() else {
            self.queue.queue_update_draw(move |d| d.set_catalog(catalog));
            return;
        };

        let brewfile = &self.use_cases.brewfile;
        let scoped = brewfile.resolve(&manifest, &catalog).await;
        let preview = catalog.clone();
        self.queue.queue_update_draw(move |d| {
            d.set_catalog(preview);
            d.set_brewfile_packages(scoped);
        });

        let extra = brewfile.fetch_tap_packages(&manifest, &catalog).await;
        if extra.is_empty() {
            return;
        }
        catalog.extend(extra);
        sort_packages(&mut catalog);
        let scoped = brewfile.resolve(&manifest, &catalog).await;
        self.queue.queue_update_draw(move |d| {
            d.set_catalog(catalog);
            d.set_brewfile_packages(scoped);
        });
    }

    async fn run_single(&self, action: Action, package: Package) {
        let sink = self.sink();
        let notifier = self.notifier();
        let result = match action {
            Action::Install => self.use_cases.install.execute(&package, sink, &notifier).await,
            Action::Update => self.use_cases.update.execute(&package, sink, &notifier).await,
            Action::Remove => self.use_cases.remove.execute(&package, sink, &notifier).await,
            _ => return,
        };
        if result.is_ok() {
            self.after_operation().await;
        }
    }

    async fn run_batch(&self, operation: BatchOperation, packages: Vec<Package>) {
        let summary = self
            .use_cases
            .brewfile
            .batch_apply(operation, &packages, self.sink(), &self.notifier())
            .await;
        if summary.succeeded > 0 {
            self.after_operation().await;
        }
    }
}

/// Dashboard controller: boots the data pipeline and turns key actions into background work.
///
/// Methods taking `&mut Dashboard` run on the UI thread; the work they start reports back
/// through the draw queue only.
pub struct AppService {
    context: TaskContext,
    executor: AsyncExecutor,
    keymap: Keymap,
}

impl AppService {
    pub fn new(
        use_cases: Arc<UseCaseContainer>,
        executor: AsyncExecutor,
        queue: DrawQueue,
        brewfile_path: Option<&Path>,
    ) -> Result<Self> {
        let manifest = brewfile_path
            .map(BrewfileOrchestrator::parse)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            context: TaskContext {
                use_cases,
                queue,
                manifest,
            },
            executor,
            keymap: Keymap::new(),
        })
    }

    pub fn is_brewfile_mode(&self) -> bool {
        self.context.manifest.is_some()
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn create_dashboard(&self) -> Dashboard {
        Dashboard::new(AppInfo::current(), self.is_brewfile_mode())
    }

    /// Counts the task as running until it finishes, even when it panics.
    fn spawn_task<F>(&self, dashboard: &mut Dashboard, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        dashboard.begin_task();
        let queue = self.context.queue.clone();
        self.executor.spawn(async move {
            if let Err(e) = tokio::spawn(task).await {
                tracing::error!("Background task failed: {}", e);
            }
            queue.queue_update_draw(|d| d.end_task());
        });
    }

    /// Taps first (Brewfile mode), then the brew version, then the package data.
    pub fn boot(&self, dashboard: &mut Dashboard, force_download: bool) {
        tracing::info!("Booting dashboard (brewfile mode: {})", self.is_brewfile_mode());
        let ctx = self.context.clone();
        self.spawn_task(dashboard, async move {
            ctx.install_taps().await;
            ctx.query_version().await;
            ctx.load(force_download).await;
        });
    }

    pub fn refresh(&self, dashboard: &mut Dashboard, force_download: bool) {
        let ctx = self.context.clone();
        self.spawn_task(dashboard, async move { ctx.load(force_download).await });
    }

    /// `brew update`, then reload installed state so outdated flags are current.
    pub fn update_homebrew(&self, dashboard: &mut Dashboard) {
        let ctx = self.context.clone();
        self.spawn_task(dashboard, async move {
            let result = ctx
                .use_cases
                .update_homebrew
                .execute(ctx.sink(), &ctx.notifier())
                .await;
            if result.is_ok() {
                ctx.after_operation().await;
            }
        });
    }

    pub fn check_for_updates(&self, dashboard: &mut Dashboard) {
        let ctx = self.context.clone();
        self.spawn_task(dashboard, async move { ctx.check_for_updates().await });
    }

    /// Returns `false` when the user asked to quit.
    pub fn handle_key(&self, dashboard: &mut Dashboard, key: Key) -> bool {
        let ctx = dashboard.input_context();
        if ctx.search_focused {
            if let Key::Char(c) = key {
                let mut query = dashboard.filter.search_query().to_string();
                query.push(c);
                dashboard.search(&query);
                return true;
            }
        }

        match self.keymap.dispatch(key, &ctx) {
            Some(action) => self.perform(dashboard, action),
            None => true,
        }
    }

    /// Returns `false` for [`Action::Quit`].
    pub fn perform(&self, dashboard: &mut Dashboard, action: Action) -> bool {
        tracing::debug!("Action {:?}", action);
        match action {
            Action::FocusSearch => dashboard.search_focused = true,
            Action::ToggleFilter(filter) => dashboard.toggle_filter(filter),
            Action::Help => dashboard.toggle_help(),
            Action::Back => {
                dashboard.search_focused = false;
                if dashboard.help_visible() {
                    dashboard.toggle_help();
                }
            }
            Action::Quit => return false,
            Action::Install | Action::Update | Action::Remove => {
                let Some(package) = dashboard.selected_package().cloned() else {
                    self.context.notifier().warning("No package selected");
                    return true;
                };
                dashboard.output.clear();
                let ctx = self.context.clone();
                self.spawn_task(dashboard, async move { ctx.run_single(action, package).await });
            }
            Action::UpdateAll => {
                dashboard.output.clear();
                let ctx = self.context.clone();
                self.spawn_task(dashboard, async move {
                    let result = ctx
                        .use_cases
                        .update_all
                        .execute(ctx.sink(), &ctx.notifier())
                        .await;
                    if result.is_ok() {
                        ctx.after_operation().await;
                    }
                });
            }
            Action::InstallAll | Action::RemoveAll => {
                if !self.is_brewfile_mode() {
                    return true;
                }
                let operation = if action == Action::InstallAll {
                    BatchOperation::InstallAll
                } else {
                    BatchOperation::RemoveAll
                };
                let packages = dashboard.brewfile_packages().to_vec();
                dashboard.output.clear();
                let ctx = self.context.clone();
                self.spawn_task(dashboard, async move { ctx.run_batch(operation, packages).await });
            }
        }
        true
    }

    /// Plain-text frame: header, legend, search line, results, banner.
    pub fn render(&self, dashboard: &Dashboard) -> String {
        let mut lines = vec![
            dashboard.header_line(),
            self.keymap.legend_line(&dashboard.input_context()),
            format!(
                "{}{} [{}]",
                dashboard.filter.label(),
                dashboard.filter.search_query(),
                dashboard.counter()
            ),
        ];

        let width = dashboard
            .visible()
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0);
        for package in dashboard.visible() {
            let marker = match (package.locally_installed, package.outdated) {
                (true, true) => "*",
                (true, false) => "+",
                _ => " ",
            };
            lines.push(format!(
                "{} {:<width$}  {:<12}  {}",
                marker,
                package.name,
                package.version,
                package.description,
                width = width
            ));
        }

        if let Some(notification) = dashboard.banner.current() {
            lines.push(notification.render());
        }
        lines.join("\n")
    }
}
