//! 通知领域模型

pub mod notification;
pub mod repository;

pub use notification::*;
pub use repository::*;
