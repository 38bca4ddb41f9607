pub mod async_executor;
pub mod draw_queue;
pub mod log_capture;

pub use async_executor::AsyncExecutor;
pub use draw_queue::{DrawLoop, DrawQueue, QueuedNotifier, QueuedOutput, QueuedStreamObserver};
