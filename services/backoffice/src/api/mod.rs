//! HTTP 接口层

pub mod activity;
pub mod auth;
pub mod envelope;
pub mod extract;
pub mod notification;
pub mod rbac;
pub mod state;

pub use envelope::{ApiError, ApiResponse, ApiResult};
pub use extract::{ClientOrigin, CurrentUser};
pub use state::AppState;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::audit::ActivityLogRepository;
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::UserRepository;

/// 组装完整路由
pub fn router<U, R, S, L, N>(state: AppState<U, R, S, L, N>) -> Router
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/activity-logs", activity::routes())
        .nest("/api/notifications", notification::routes())
        .nest("/api/users", rbac::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
