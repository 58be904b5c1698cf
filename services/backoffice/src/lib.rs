//! stockdesk-backoffice - 后台管理服务
//!
//! 认证、RBAC 访问控制、操作审计与站内通知

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
