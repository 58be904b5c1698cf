//! 通知路由

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use stockdesk_common::{Pagination, UserId};
use uuid::Uuid;

use crate::domain::audit::ActivityLogRepository;
use crate::domain::notification::{NotificationId, NotificationPayload, NotificationRepository};
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::UserRepository;

use super::envelope::{ApiResponse, ApiResult};
use super::extract::{ClientOrigin, CurrentUser};
use super::state::AppState;

/// 允许创建通知的角色（操作员侧）
const NOTIFIER_ROLES: &[&str] = &["admin", "owner", "manager"];

pub fn routes<U, R, S, L, N>() -> Router<AppState<U, R, S, L, N>>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .route("/me", get(list_mine))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
        .route("/{id}", delete(delete_one))
        .route("/read/all", delete(delete_read))
        .route("/", post(create_for_user))
        .route("/roles", post(create_for_roles))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.limit.unwrap_or(20))
    }
}

#[derive(Debug, Deserialize)]
struct CreateNotificationRequest {
    user_id: Uuid,
    #[serde(flatten)]
    payload: NotificationPayload,
}

#[derive(Debug, Deserialize)]
struct CreateForRolesRequest {
    role_names: Vec<String>,
    #[serde(flatten)]
    payload: NotificationPayload,
}

async fn list_mine<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let result = state
        .notifications
        .list_for_user(&user.id, &query.pagination())
        .await?;

    Ok(ApiResponse::data(result))
}

async fn unread_count<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let count = state.notifications.unread_count(&user.id).await?;
    Ok(ApiResponse::data(json!({ "count": count })))
}

async fn mark_read<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let notification = state
        .notifications
        .mark_read(&user.id, &NotificationId::from_uuid(id), origin)
        .await?;

    Ok(ApiResponse::data(notification))
}

async fn mark_all_read<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let count = state.notifications.mark_all_read(&user.id, origin).await?;

    Ok(ApiResponse::data(json!({
        "message": "All notifications marked as read",
        "count": count,
    })))
}

async fn delete_one<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    state
        .notifications
        .delete(&user.id, &NotificationId::from_uuid(id), origin)
        .await?;

    Ok(ApiResponse::message("Notification deleted"))
}

async fn delete_read<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let count = state.notifications.delete_read(&user.id, origin).await?;

    Ok(ApiResponse::data(json!({
        "message": "Read notifications deleted",
        "count": count,
    })))
}

async fn create_for_user<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    state
        .access
        .require_any_role(Some(&user.id), NOTIFIER_ROLES)
        .await?;

    let notification = state
        .notifications
        .create_for_user(
            &user.id,
            UserId::from_uuid(request.user_id),
            request.payload,
            origin,
        )
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::data(notification)))
}

async fn create_for_roles<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Json(request): Json<CreateForRolesRequest>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    state
        .access
        .require_any_role(Some(&user.id), NOTIFIER_ROLES)
        .await?;

    let role_names: Vec<&str> = request.role_names.iter().map(String::as_str).collect();
    let notifications = state
        .notifications
        .create_for_roles(&user.id, &role_names, request.payload, origin)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(json!({ "count": notifications.len() })),
    ))
}
