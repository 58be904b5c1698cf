//! 请求提取器

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use stockdesk_errors::AppError;

use crate::domain::audit::{ActivityLogRepository, RequestOrigin};
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::{User, UserRepository};

use super::envelope::ApiError;
use super::state::AppState;

/// 当前登录用户
///
/// 每个请求都验证 Bearer 令牌并重新读取用户记录，
/// 令牌里只信任身份键：角色变更在下一个请求立即生效
pub struct CurrentUser(pub User);

impl<U, R, S, L, N> FromRequestParts<AppState<U, R, S, L, N>> for CurrentUser
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    S: SessionRepository + 'static,
    L: ActivityLogRepository + 'static,
    N: NotificationRepository + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, R, S, L, N>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match header_value {
            Some(h) if h.starts_with("Bearer ") => &h[7..],
            _ => {
                return Err(AppError::unauthorized("Missing or invalid authorization header")
                    .into());
            }
        };

        let claims = state.token_service.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        let user = state
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        Ok(CurrentUser(user))
    }
}

/// 请求来源（调用方地址与 User-Agent）
pub struct ClientOrigin(pub RequestOrigin);

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|h| h.to_str().ok())
                    .map(|v| v.to_string())
            });

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|v| v.to_string());

        Ok(ClientOrigin(RequestOrigin {
            ip_address,
            user_agent,
        }))
    }
}
