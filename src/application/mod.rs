pub mod filter;
pub mod package_repository;
pub mod stream_loader;
pub mod use_case_container;
pub mod use_cases;

pub use filter::{FilterEngine, PackageFilter};
pub use package_repository::{DataStage, PackageRepository};
pub use stream_loader::{PackageStreamLoader, StreamObserver};
pub use use_case_container::UseCaseContainer;
