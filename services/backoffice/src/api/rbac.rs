//! 角色分配路由

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use stockdesk_common::UserId;
use uuid::Uuid;

use crate::application::rbac::ADMIN_ROLE;
use crate::domain::audit::ActivityLogRepository;
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::UserRepository;

use super::envelope::{ApiResponse, ApiResult};
use super::extract::{ClientOrigin, CurrentUser};
use super::state::AppState;

pub fn routes<U, R, S, L, N>() -> Router<AppState<U, R, S, L, N>>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .route("/{id}/roles", post(assign_role))
        .route("/{id}/roles/{role_name}", delete(revoke_role))
}

#[derive(Debug, Deserialize)]
struct AssignRoleRequest {
    role_name: String,
}

async fn assign_role<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
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
        .require_any_role(Some(&user.id), &[ADMIN_ROLE])
        .await?;

    let target = state
        .role_assignments
        .assign_role(
            &user.id,
            &UserId::from_uuid(id),
            &request.role_name,
            origin,
        )
        .await?;

    Ok(ApiResponse::data(json!({
        "user_id": target.id.to_string(),
        "roles": target.role_ids.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
    })))
}

async fn revoke_role<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    ClientOrigin(origin): ClientOrigin,
    Path((id, role_name)): Path<(Uuid, String)>,
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
        .require_any_role(Some(&user.id), &[ADMIN_ROLE])
        .await?;

    let target = state
        .role_assignments
        .revoke_role(&user.id, &UserId::from_uuid(id), &role_name, origin)
        .await?;

    Ok(ApiResponse::data(json!({
        "user_id": target.id.to_string(),
        "roles": target.role_ids.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
    })))
}
