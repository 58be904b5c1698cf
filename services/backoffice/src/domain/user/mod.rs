//! 用户领域模型

pub mod password;
pub mod repository;
pub mod user;

pub use password::*;
pub use repository::*;
pub use user::*;
