//! 操作日志路由

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use stockdesk_common::Pagination;
use stockdesk_errors::AppError;
use uuid::Uuid;

use crate::application::rbac::ADMIN_ROLE;
use crate::domain::audit::{
    ActivityAction, ActivityLogFilter, ActivityLogId, ActivityLogRepository, ActivityOutcome,
};
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::UserRepository;

use super::envelope::{ApiResponse, ApiResult};
use super::extract::CurrentUser;
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
        .route("/", get(list_all))
        .route("/me", get(list_mine))
        .route("/{id}", get(get_by_id).delete(delete_by_id))
}

#[derive(Debug, Deserialize)]
struct ActivityLogQuery {
    page: Option<u32>,
    limit: Option<u32>,
    user_id: Option<Uuid>,
    action: Option<String>,
    resource: Option<String>,
    resource_id: Option<Uuid>,
    status: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    search: Option<String>,
}

impl ActivityLogQuery {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.limit.unwrap_or(20))
    }

    fn filter(&self) -> ApiResult<ActivityLogFilter> {
        let action = self
            .action
            .as_deref()
            .map(str::parse::<ActivityAction>)
            .transpose()
            .map_err(AppError::validation)?;
        let outcome = self
            .status
            .as_deref()
            .map(str::parse::<ActivityOutcome>)
            .transpose()
            .map_err(AppError::validation)?;

        Ok(ActivityLogFilter {
            actor: self.user_id.map(stockdesk_common::UserId::from_uuid),
            action,
            resource: self.resource.clone(),
            resource_id: self.resource_id,
            outcome,
            from: self.start_date,
            until: self.end_date,
            search: self.search.clone(),
        })
    }
}

/// 全量日志视图，仅限操作员角色
async fn list_all<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ActivityLogQuery>,
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

    let result = state
        .activity
        .list(&query.filter()?, &query.pagination())
        .await?;

    Ok(ApiResponse::data(result))
}

/// 本人日志视图，无需额外权限
async fn list_mine<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ActivityLogQuery>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let result = state
        .activity
        .list_for_actor(&user.id, query.filter()?, &query.pagination())
        .await?;

    Ok(ApiResponse::data(result))
}

async fn get_by_id<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let entry = state.activity.get(&ActivityLogId::from_uuid(id)).await?;
    Ok(ApiResponse::data(entry))
}

/// 删除单条日志，仅限操作员角色；不提供批量删除
async fn delete_by_id<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    CurrentUser(user): CurrentUser,
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
        .access
        .require_any_role(Some(&user.id), &[ADMIN_ROLE])
        .await?;

    state.activity.delete(&ActivityLogId::from_uuid(id)).await?;

    Ok(ApiResponse::message("Activity log entry deleted"))
}
