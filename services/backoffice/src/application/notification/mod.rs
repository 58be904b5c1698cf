//! 通知应用服务

pub mod service;

pub use service::*;
