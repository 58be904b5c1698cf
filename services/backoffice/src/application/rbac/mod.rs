//! RBAC 应用服务

pub mod handlers;
pub mod seed;

pub use handlers::*;
pub use seed::*;
