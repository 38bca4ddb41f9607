use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::OnceLock;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_SENDER: OnceLock<Sender<String>> = OnceLock::new();

const CAPTURED_TARGETS: [&str; 3] = [
    "boldbrew::infrastructure",
    "boldbrew::application",
    "boldbrew::presentation",
];

/// Default capture level, lowered to TRACE by the `verbose-logging` feature or `verbose`.
pub fn capture_level(verbose: bool) -> LevelFilter {
    if verbose || cfg!(feature = "verbose-logging") {
        LevelFilter::TRACE
    } else if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Installs the global subscriber. Returns `None` when capture was already set up.
pub fn init_log_capture(verbose: bool) -> Option<Receiver<String>> {
    let (tx, rx) = channel();
    LOG_SENDER.set(tx.clone()).ok()?;

    let capture_layer = CaptureLayer { sender: tx };

    tracing_subscriber::registry()
        .with(capture_level(verbose))
        .with(capture_layer)
        .try_init()
        .ok()?;

    Some(rx)
}

struct CaptureLayer {
    sender: Sender<String>,
}

fn is_captured(target: &str) -> bool {
    CAPTURED_TARGETS.iter().any(|prefix| target.starts_with(prefix))
}

impl<S> Layer<S> for CaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let metadata = event.metadata();
        if !is_captured(metadata.target()) {
            return;
        }

        let mut visitor = LogVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        if !visitor.message.is_empty() {
            let log_entry = format!("[{}] {}", metadata.level(), visitor.message);
            let _ = self.sender.send(log_entry);
        }
    }
}

struct LogVisitor {
    message: String,
}

impl tracing::field::Visit for LogVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}
