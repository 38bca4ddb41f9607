//! Marshals UI updates from background tasks onto the thread that owns the [`Dashboard`].

use crate::domain::entities::Package;
use crate::domain::services::{NotificationLevel, Notifier, OutputSink, OutputStream};
use crate::application::StreamObserver;
use crate::presentation::ui::Dashboard;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;

pub type DrawFn = Box<dyn FnOnce(&mut Dashboard) + Send>;

/// Producer side, cloned into every background task.
#[derive(Clone)]
pub struct DrawQueue {
    sender: Sender<DrawFn>,
}

/// Consumer side, owned by the UI thread.
pub struct DrawLoop {
    receiver: Receiver<DrawFn>,
}

impl DrawQueue {
    pub fn channel() -> (DrawQueue, DrawLoop) {
        let (sender, receiver) = channel();
        (DrawQueue { sender }, DrawLoop { receiver })
    }

    /// Enqueues `update` and wakes the UI thread.
    pub fn queue_update_draw<F>(&self, update: F)
    where
        F: FnOnce(&mut Dashboard) + Send + 'static,
    {
        if self.sender.send(Box::new(update)).is_err() {
            tracing::trace!("Draw queue closed, dropping update");
        }
    }
}

impl DrawLoop {
    /// Applies every queued update without blocking.
    pub fn drain(&self, dashboard: &mut Dashboard) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.receiver.try_recv() {
            update(dashboard);
            applied += 1;
        }
        applied
    }

    /// Blocks up to `timeout` for the next update, then drains the rest.
    /// Returns `None` once every [`DrawQueue`] is gone.
    pub fn wait(&self, dashboard: &mut Dashboard, timeout: Duration) -> Option<usize> {
        match self.receiver.recv_timeout(timeout) {
            Ok(update) => {
                update(dashboard);
                Some(1 + self.drain(dashboard))
            }
            Err(RecvTimeoutError::Timeout) => Some(0),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// [`OutputSink`] that appends to the dashboard's output pane via the draw queue.
#[derive(Clone)]
pub struct QueuedOutput {
    queue: DrawQueue,
}

impl QueuedOutput {
    pub fn new(queue: DrawQueue) -> Self {
        Self { queue }
    }
}

impl OutputSink for QueuedOutput {
    fn append(&self, stream: OutputStream, text: &str) {
        let text = text.to_string();
        self.queue
            .queue_update_draw(move |d| d.output.append(stream, &text));
    }

    fn scroll_to_end(&self) {
        self.queue.queue_update_draw(|d| d.output.scroll_to_end());
    }
}

#[derive(Clone)]
pub struct QueuedNotifier {
    queue: DrawQueue,
}

impl QueuedNotifier {
    pub fn new(queue: DrawQueue) -> Self {
        Self { queue }
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        let message = message.to_string();
        self.queue
            .queue_update_draw(move |d| d.banner.show(level, message));
    }
}

/// Pushes each partial package list to the dashboard catalog.
pub struct QueuedStreamObserver {
    queue: DrawQueue,
    notifier: QueuedNotifier,
}

impl QueuedStreamObserver {
    pub fn new(queue: DrawQueue) -> Self {
        Self {
            notifier: QueuedNotifier::new(queue.clone()),
            queue,
        }
    }
}

impl StreamObserver for QueuedStreamObserver {
    fn publish(&mut self, packages: &[Package]) {
        let packages = packages.to_vec();
        self.queue.queue_update_draw(move |d| d.set_catalog(packages));
    }

    fn warn(&mut self, error: &anyhow::Error) {
        self.notifier.warning(&format!("{:#}", error));
    }

    fn complete(&mut self, total: usize) {
        self.notifier.success(&format!("Loaded {} packages", total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AppInfo;

    #[test]
    fn updates_apply_in_order_on_the_owner() {
        let (queue, draw_loop) = DrawQueue::channel();
        let output = QueuedOutput::new(queue.clone());
        let notifier = QueuedNotifier::new(queue.clone());

        let worker = std::thread::spawn(move || {
            output.append(OutputStream::Stdout, "a");
            output.append(OutputStream::Stderr, "b");
            output.scroll_to_end();
            notifier.success("done");
        });
        worker.join().unwrap();

        let mut dashboard = Dashboard::new(AppInfo::current(), false);
        assert_eq!(draw_loop.drain(&mut dashboard), 4);
        assert_eq!(dashboard.output.text(), "ab");
        assert!(dashboard.output.is_following());
        assert_eq!(dashboard.banner.current().unwrap().message, "done");
    }

    #[test]
    fn wait_reports_disconnect() {
        let (queue, draw_loop) = DrawQueue::channel();
        let mut dashboard = Dashboard::new(AppInfo::current(), false);
        queue.queue_update_draw(|d| d.begin_task());
        drop(queue);

        assert_eq!(draw_loop.wait(&mut dashboard, Duration::from_millis(10)), Some(1));
        assert!(dashboard.is_busy());
        assert_eq!(draw_loop.wait(&mut dashboard, Duration::from_millis(10)), None);
    }
}
