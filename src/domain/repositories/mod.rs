pub mod command_runner;
pub mod package_manager;

pub use command_runner::CommandRunner;
pub use package_manager::{PackageManagerPort, RemoteDataset};
