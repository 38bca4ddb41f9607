pub mod brewfile_operations;
pub mod package_operations;
pub mod self_update;

pub use brewfile_operations::*;
pub use package_operations::*;
pub use self_update::*;
