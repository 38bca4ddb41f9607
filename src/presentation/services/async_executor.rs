use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Background runtime owned by the UI thread; background work never runs on the UI thread.
pub struct AsyncExecutor {
    runtime: Arc<tokio::runtime::Runtime>,
}

impl AsyncExecutor {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("bbrew-worker")
            .build()
            .context("failed to start async runtime")?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    /// Blocks the calling thread; only for start-up work that must finish before drawing.
    pub fn execute<F, T>(&self, future: F) -> T
    where
        F: Future<Output = T>,
    {
        self.runtime.block_on(future)
    }
}

impl Clone for AsyncExecutor {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
        }
    }
}
