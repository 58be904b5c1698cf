//! 认证命令与结果

use serde::{Deserialize, Serialize};

use crate::domain::audit::RequestOrigin;

/// 注册命令
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCommand {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    #[serde(skip)]
    pub origin: RequestOrigin,
}

/// 登录命令
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
    #[serde(skip)]
    pub origin: RequestOrigin,
}

/// 刷新访问令牌命令
#[derive(Debug, Clone)]
pub struct RefreshCommand {
    pub refresh_token: String,
}

/// 登出命令
#[derive(Debug, Clone)]
pub struct LogoutCommand {
    pub refresh_token: String,
    pub origin: RequestOrigin,
}

/// 令牌对
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    /// 刷新令牌不进入响应体，由 HTTP 层放入 HttpOnly Cookie
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub tokens: TokenPair,
    pub user_id: String,
    pub session_id: String,
}

/// 刷新结果
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}
