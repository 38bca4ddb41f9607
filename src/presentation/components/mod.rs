pub mod filter_state;
pub mod log_manager;
pub mod notification;
pub mod output_pane;

pub use filter_state::FilterState;
pub use log_manager::LogManager;
pub use notification::{Notification, NotificationBanner};
pub use output_pane::OutputPane;
