//! 审计领域模型

pub mod activity_log;
pub mod repository;

pub use activity_log::*;
pub use repository::*;
