pub mod sink;
pub mod validation;

pub use sink::{NotificationLevel, Notifier, OutputSink, OutputStream};
pub use validation::PackageValidator;
