//! PostgreSQL 仓储实现

pub mod activity_log_repository;
pub mod notification_repository;
pub mod permission_repository;
pub mod role_repository;
pub mod session_repository;
pub mod user_repository;

pub use activity_log_repository::PostgresActivityLogRepository;
pub use notification_repository::PostgresNotificationRepository;
pub use permission_repository::PostgresPermissionRepository;
pub use role_repository::PostgresRoleRepository;
pub use session_repository::PostgresSessionRepository;
pub use user_repository::PostgresUserRepository;

use stockdesk_errors::AppError;

/// 将 sqlx 错误转换为 AppError
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> AppError {
    AppError::database(e.to_string())
}
