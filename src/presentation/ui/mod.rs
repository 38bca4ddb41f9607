pub mod app;
pub mod dashboard;

pub use app::AppService;
pub use dashboard::Dashboard;
