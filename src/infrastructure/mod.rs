pub mod brew;
pub mod cache;
pub mod config_repository;

pub use cache::{Cache, CacheFile};
pub use config_repository::ConfigRepository;
