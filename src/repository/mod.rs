//! Database repository layer

pub mod settings_repo;
pub mod task_repo;
pub mod user_repo;

pub use settings_repo::*;
pub use task_repo::*;
pub use user_repo::*;
