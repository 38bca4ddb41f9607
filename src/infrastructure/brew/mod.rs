pub mod api;
pub mod command;
pub mod error;
pub mod executor;
pub mod repository;

pub use api::ApiClient;
pub use command::BrewCommand;
pub use error::BrewError;
pub use executor::CommandExecutor;
pub use repository::BrewPackageManager;
