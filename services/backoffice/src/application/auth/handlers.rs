//! 认证流程处理器

use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use stockdesk_auth_core::TokenService;
use stockdesk_errors::{AppError, AppResult};

use crate::application::audit::{ActivityEvent, ActivityRecorder};
use crate::application::rbac::DEFAULT_ROLE;
use crate::domain::audit::{ActivityAction, ActivityLogRepository};
use crate::domain::rbac::RoleRepository;
use crate::domain::session::{Session, SessionRepository};
use crate::domain::user::{HashedPassword, User, UserRepository};

use super::commands::{
    LoginCommand, LoginResult, LogoutCommand, RefreshCommand, RefreshResult, RegisterCommand,
    TokenPair,
};

/// 登录失败的统一对外消息：用户名错误与密码错误不可区分
const LOGIN_FAILED: &str = "Invalid username or password";

/// 刷新令牌的 SHA-256 摘要（十六进制），用于会话落库
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// 认证服务
pub struct AuthService<U, R, S, L>
where
    U: UserRepository,
    R: RoleRepository,
    S: SessionRepository,
    L: ActivityLogRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    session_repo: Arc<S>,
    recorder: Arc<ActivityRecorder<L>>,
    token_service: Arc<TokenService>,
}

impl<U, R, S, L> AuthService<U, R, S, L>
where
    U: UserRepository,
    R: RoleRepository,
    S: SessionRepository,
    L: ActivityLogRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        role_repo: Arc<R>,
        session_repo: Arc<S>,
        recorder: Arc<ActivityRecorder<L>>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            session_repo,
            recorder,
            token_service,
        }
    }

    /// 注册新用户
    ///
    /// 分配且仅分配默认角色；目录未播种时注册直接失败
    pub async fn register(&self, command: RegisterCommand) -> AppResult<User> {
        validate_username(&command.username)?;
        validate_email(&command.email)?;

        if self.user_repo.exists_by_username(&command.username).await? {
            return Err(AppError::validation("Username already exists"));
        }
        if self.user_repo.exists_by_email(&command.email).await? {
            return Err(AppError::validation("Email already exists"));
        }

        let password_hash = HashedPassword::from_plain(&command.password)?;

        let mut user = User::new(command.username, command.email, password_hash);
        user.first_name = command.first_name;
        user.last_name = command.last_name;
        user.phone_number = command.phone_number;
        user.address = command.address;

        let default_role = self
            .role_repo
            .find_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Default role \"{}\" not found; run the RBAC seeder first",
                    DEFAULT_ROLE
                ))
            })?;
        user.assign_role(default_role.id);

        self.user_repo.create(&user).await?;

        self.recorder
            .record(
                ActivityEvent::auth(
                    user.id.clone(),
                    ActivityAction::Register,
                    format!("User {} registered", user.username),
                )
                .with_origin(command.origin),
            )
            .await;

        Ok(user)
    }

    /// 登录
    ///
    /// 会话写入失败对登录是致命的：没有可审计的会话记录就不发令牌
    pub async fn login(&self, command: LoginCommand) -> AppResult<LoginResult> {
        let user = match self.user_repo.find_by_username(&command.username).await? {
            Some(user) => user,
            // 不存在的用户名不产生审计条目，也不暴露存在性
            None => return Err(AppError::unauthorized(LOGIN_FAILED)),
        };

        if !user.password_hash.verify(&command.password)? {
            self.recorder
                .record(
                    ActivityEvent::auth(
                        user.id.clone(),
                        ActivityAction::Login,
                        format!("Failed login for {}", user.username),
                    )
                    .with_origin(command.origin.clone())
                    .with_error("invalid credentials"),
                )
                .await;
            return Err(AppError::unauthorized(LOGIN_FAILED));
        }

        if !user.is_active() {
            self.recorder
                .record(
                    ActivityEvent::auth(
                        user.id.clone(),
                        ActivityAction::Login,
                        format!("Failed login for {}", user.username),
                    )
                    .with_origin(command.origin.clone())
                    .with_error("account disabled"),
                )
                .await;
            return Err(AppError::forbidden("User account is not active"));
        }

        let access_token = self.token_service.issue_access_token(&user.id)?;
        let refresh_token = self.token_service.issue_refresh_token(&user.id)?;

        let expires_at =
            Utc::now() + Duration::seconds(self.token_service.refresh_token_expires_in());
        let mut session = Session::new(user.id.clone(), hash_token(&refresh_token), expires_at);
        if let Some(ip) = command.origin.ip_address.clone() {
            session = session.with_ip_address(ip);
        }
        if let Some(agent) = command.origin.user_agent.clone() {
            session = session.with_user_agent(agent);
        }

        self.session_repo.save(&session).await?;

        self.recorder
            .record(
                ActivityEvent::auth(
                    user.id.clone(),
                    ActivityAction::Login,
                    format!("User {} logged in", user.username),
                )
                .with_origin(command.origin),
            )
            .await;

        Ok(LoginResult {
            tokens: TokenPair {
                access_token,
                refresh_token,
                expires_in: self.token_service.access_token_expires_in(),
                token_type: "Bearer".to_string(),
            },
            user_id: user.id.to_string(),
            session_id: session.id.to_string(),
        })
    }

    /// 用刷新令牌换新的访问令牌
    ///
    /// 会话必须存在且未吊销未过期；用户记录重新读取
    pub async fn refresh(&self, command: RefreshCommand) -> AppResult<RefreshResult> {
        let claims = self
            .token_service
            .validate_refresh_token(&command.refresh_token)?;
        let user_id = claims.user_id()?;

        let session = self
            .session_repo
            .find_by_token_hash(&hash_token(&command.refresh_token))
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown refresh token"))?;

        if session.user_id != user_id || !session.is_valid() {
            return Err(AppError::unauthorized("Session expired or revoked"));
        }

        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        if !user.is_active() {
            return Err(AppError::forbidden("User account is not active"));
        }

        let access_token = self.token_service.issue_access_token(&user.id)?;

        Ok(RefreshResult {
            access_token,
            expires_in: self.token_service.access_token_expires_in(),
            token_type: "Bearer".to_string(),
        })
    }

    /// 登出：吊销刷新令牌绑定的会话
    ///
    /// 幂等：会话已不存在时仍然成功
    pub async fn logout(&self, command: LogoutCommand) -> AppResult<()> {
        let claims = self
            .token_service
            .validate_refresh_token(&command.refresh_token)?;
        let user_id = claims.user_id()?;

        if let Some(session) = self
            .session_repo
            .find_by_token_hash(&hash_token(&command.refresh_token))
            .await?
        {
            self.session_repo.revoke(&session.id).await?;
        }

        self.recorder
            .record(
                ActivityEvent::auth(user_id, ActivityAction::Logout, "User logged out")
                    .with_origin(command.origin),
            )
            .await;

        Ok(())
    }
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.len() < 3 || username.len() > 32 {
        return Err(AppError::validation(
            "Username must be between 3 and 32 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_' and '.'",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if !valid {
        return Err(AppError::validation("Invalid email address"));
    }
    Ok(())
}
