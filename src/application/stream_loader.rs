use super::package_repository::{DataStage, PackageRepository, sort_packages};
use crate::domain::entities::{AppConfig, Package, PackageKey};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

const ERROR_CHANNEL_CAPACITY: usize = 8;

/// Receives the growing package list while a load is in flight.
pub trait StreamObserver: Send {
    /// Called with everything received so far.
    fn publish(&mut self, packages: &[Package]);
    /// Non-fatal: loading continues.
    fn warn(&mut self, error: &anyhow::Error);
    fn complete(&mut self, total: usize);
}

/// Runs a repository load in the background and hands packages over as they arrive.
pub struct PackageStreamLoader {
    repository: Arc<PackageRepository>,
    batch_size: usize,
    flush_interval: Duration,
}

impl PackageStreamLoader {
    pub fn new(repository: Arc<PackageRepository>, batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            repository,
            batch_size: batch_size.max(1),
            flush_interval,
        }
    }

    pub fn from_config(repository: Arc<PackageRepository>, config: &AppConfig) -> Self {
        Self::new(repository, config.stream_batch_size, config.stream_flush_interval())
    }

    /// Spawns the producer. Installed formulae are sent as soon as they load, ahead of
    /// the catalog downloads; the full merge follows once every dataset is in. A load
    /// error goes to the error channel and whatever data the repository holds is still
    /// sent.
    pub fn stream(&self, force_download: bool) -> (mpsc::Receiver<Package>, mpsc::Receiver<anyhow::Error>) {
        let (package_tx, package_rx) = mpsc::channel(self.batch_size);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let repository = Arc::clone(&self.repository);

        tokio::spawn(async move {
            repository.prepare_cache();
            for stage in DataStage::ALL {
                if let Err(e) = repository.load_stage(stage, force_download).await {
                    tracing::error!("Package data load failed: {:#}", e);
                    if error_tx.send(e).await.is_err() {
                        tracing::debug!("Stream error receiver dropped");
                    }
                    break;
                }
                if stage == DataStage::InstalledFormulae
                    && !send_all(&package_tx, repository.get_packages()).await
                {
                    return;
                }
            }

            send_all(&package_tx, repository.get_packages()).await;
        });

        (package_rx, error_rx)
    }

    /// Consumes both channels until the package channel closes, flushing to `observer`
    /// every `batch_size` packages or every `flush_interval`, whichever comes first.
    /// Returns the number of distinct packages received.
    pub async fn ingest<O>(
        &self,
        mut packages: mpsc::Receiver<Package>,
        mut errors: mpsc::Receiver<anyhow::Error>,
        observer: &mut O,
    ) -> usize
    where
        O: StreamObserver + ?Sized,
    {
        let mut buffer: Vec<Package> = Vec::new();
        let mut index: HashMap<PackageKey, usize> = HashMap::new();
        let mut pending = 0usize;
        let mut flushed_once = false;
        let mut errors_open = true;

        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                received = packages.recv() => match received {
                    Some(package) => {
                        match index.get(&package.key()) {
                            Some(&slot) => buffer[slot] = package,
                            None => {
                                index.insert(package.key(), buffer.len());
                                buffer.push(package);
                            }
                        }
                        pending += 1;
                        if pending >= self.batch_size {
                            flush(&mut buffer, &mut index, observer);
                            pending = 0;
                            flushed_once = true;
                        }
                    }
                    None => break,
                },
                received = errors.recv(), if errors_open => match received {
                    Some(error) => {
                        tracing::warn!("Package stream: {:#}", error);
                        observer.warn(&error);
                    }
                    None => errors_open = false,
                },
                _ = ticker.tick() => {
                    if pending > 0 {
                        flush(&mut buffer, &mut index, observer);
                        pending = 0;
                        flushed_once = true;
                    }
                }
            }
        }

        while let Ok(error) = errors.try_recv() {
            tracing::warn!("Package stream: {:#}", error);
            observer.warn(&error);
        }

        if pending > 0 || !flushed_once {
            flush(&mut buffer, &mut index, observer);
        }
        tracing::info!("Package stream complete: {} packages", buffer.len());
        observer.complete(buffer.len());
        buffer.len()
    }
}

/// Sends `packages` in order; false once the consumer is gone.
async fn send_all(tx: &mpsc::Sender<Package>, packages: Vec<Package>) -> bool {
    tracing::debug!("Streaming {} packages", packages.len());
    for package in packages {
        if tx.send(package).await.is_err() {
            tracing::debug!("Stream consumer went away, stopping producer");
            return false;
        }
    }
    true
}

/// Early rows arrive ahead of the rest, so the buffer is re-sorted before publishing.
fn flush<O>(buffer: &mut [Package], index: &mut HashMap<PackageKey, usize>, observer: &mut O)
where
    O: StreamObserver + ?Sized,
{
    sort_packages(buffer);
    index.clear();
    index.extend(buffer.iter().enumerate().map(|(slot, package)| (package.key(), slot)));
    observer.publish(buffer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PackageType;
    use crate::infrastructure::cache::Cache;

    #[derive(Default)]
    struct Recording {
        published: Vec<usize>,
        warnings: Vec<String>,
        total: Option<usize>,
    }

    impl StreamObserver for Recording {
        fn publish(&mut self, packages: &[Package]) {
            self.published.push(packages.len());
        }

        fn warn(&mut self, error: &anyhow::Error) {
            self.warnings.push(error.to_string());
        }

        fn complete(&mut self, total: usize) {
            self.total = Some(total);
        }
    }

    fn loader(batch_size: usize) -> PackageStreamLoader {
        let port = Arc::new(crate::application::package_repository::test_support::OfflinePort);
        let repository = Arc::new(PackageRepository::new(port, Cache::new(std::env::temp_dir())));
        PackageStreamLoader::new(repository, batch_size, Duration::from_millis(150))
    }

    fn pkg(name: &str) -> Package {
        Package::new(name.to_string(), PackageType::Formula)
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_every_batch_and_once_at_the_end() {
        let loader = loader(2);
        let (tx, rx) = mpsc::channel(16);
        let (_etx, erx) = mpsc::channel(1);
        for name in ["a", "b", "c", "d", "e"] {
            tx.send(pkg(name)).await.unwrap();
        }
        drop(tx);
        drop(_etx);

        let mut observer = Recording::default();
        let total = loader.ingest(rx, erx, &mut observer).await;

        assert_eq!(total, 5);
        assert_eq!(observer.published, vec![2, 4, 5]);
        assert_eq!(observer.total, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_flushes_a_partial_batch() {
        let loader = loader(100);
        let (tx, rx) = mpsc::channel(16);
        let (etx, erx) = mpsc::channel(1);

        tokio::spawn(async move {
            tx.send(pkg("a")).await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            etx.send(anyhow::anyhow!("analytics offline")).await.unwrap();
            tx.send(pkg("b")).await.unwrap();
        });

        let mut observer = Recording::default();
        loader.ingest(rx, erx, &mut observer).await;

        assert_eq!(observer.published, vec![1, 2]);
        assert_eq!(observer.warnings, vec!["analytics offline".to_string()]);
        assert_eq!(observer.total, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_key_replaces_row() {
        let loader = loader(10);
        let (tx, rx) = mpsc::channel(16);
        let (_etx, erx) = mpsc::channel(1);
        tx.send(pkg("a")).await.unwrap();
        tx.send(pkg("a").with_version("2.0".to_string())).await.unwrap();
        drop(tx);

        let mut observer = Recording::default();
        assert_eq!(loader.ingest(rx, erx, &mut observer).await, 1);
        assert_eq!(observer.published, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_stream_still_publishes_and_completes() {
        let loader = loader(10);
        let (tx, rx) = mpsc::channel::<Package>(1);
        let (_etx, erx) = mpsc::channel(1);
        drop(tx);

        let mut observer = Recording::default();
        loader.ingest(rx, erx, &mut observer).await;
        assert_eq!(observer.published, vec![0]);
        assert_eq!(observer.total, Some(0));
    }
}
