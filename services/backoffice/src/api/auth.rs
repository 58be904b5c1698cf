//! 认证路由

use axum::extract::State;
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use stockdesk_errors::AppError;

use crate::application::auth::{LoginCommand, LogoutCommand, RefreshCommand, RegisterCommand};
use crate::domain::audit::ActivityLogRepository;
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::{User, UserRepository};

use super::envelope::{ApiResponse, ApiResult};
use super::extract::{ClientOrigin, CurrentUser};
use super::state::AppState;

const REFRESH_COOKIE: &str = "refresh_token";

pub fn routes<U, R, S, L, N>() -> Router<AppState<U, R, S, L, N>>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: String,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    roles: Vec<String>,
}

fn user_response(user: &User, roles: Vec<String>) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        roles,
    }
}

/// 刷新令牌只通过 HttpOnly Cookie 传输，脚本不可读
fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/api/auth; Max-Age={}",
        REFRESH_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_refresh_cookie(secure: bool) -> String {
    refresh_cookie("", 0, secure)
}

fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == REFRESH_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

async fn register<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    ClientOrigin(origin): ClientOrigin,
    Json(mut command): Json<RegisterCommand>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    command.origin = origin;
    let user = state.auth.register(command).await?;
    let roles = state
        .access
        .resolver()
        .active_role_names(&user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user_response(&user, roles)),
    ))
}

async fn login<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    ClientOrigin(origin): ClientOrigin,
    Json(mut command): Json<LoginCommand>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    command.origin = origin;
    let result = state.auth.login(command).await?;

    let cookie = refresh_cookie(
        &result.tokens.refresh_token,
        state.token_service.refresh_token_expires_in(),
        state.secure_cookies,
    );

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::data(json!({
            "access_token": result.tokens.access_token,
            "expires_in": result.tokens.expires_in,
            "token_type": result.tokens.token_type,
            "user_id": result.user_id,
        })),
    ))
}

async fn refresh<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let refresh_token = read_refresh_cookie(&headers)
        .ok_or_else(|| AppError::unauthorized("Missing refresh token"))?;

    let result = state.auth.refresh(RefreshCommand { refresh_token }).await?;

    Ok(ApiResponse::data(result))
}

async fn logout<U, R, S, L, N>(
    State(state): State<AppState<U, R, S, L, N>>,
    ClientOrigin(origin): ClientOrigin,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let refresh_token = read_refresh_cookie(&headers)
        .ok_or_else(|| AppError::unauthorized("Missing refresh token"))?;

    state
        .auth
        .logout(LogoutCommand {
            refresh_token,
            origin,
        })
        .await?;

    Ok((
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))],
        ApiResponse::message("Logged out"),
    ))
}

async fn me<U, R, S, L, N>(
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
    let roles = state
        .access
        .resolver()
        .active_role_names(&user.id)
        .await?;

    Ok(ApiResponse::data(user_response(&user, roles)))
}
