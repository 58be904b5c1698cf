//! 应用状态

use std::sync::Arc;

use stockdesk_auth_core::TokenService;

use crate::application::audit::ActivityLogQueryService;
use crate::application::auth::AuthService;
use crate::application::authorization::AccessControlService;
use crate::application::notification::NotificationService;
use crate::application::rbac::RoleAssignmentService;
use crate::domain::audit::ActivityLogRepository;
use crate::domain::notification::NotificationRepository;
use crate::domain::rbac::RoleRepository;
use crate::domain::session::SessionRepository;
use crate::domain::user::UserRepository;

/// 应用状态
///
/// 对仓储实现保持泛型：生产环境注入 Postgres 仓储，
/// 集成测试注入内存仓储
pub struct AppState<U, R, S, L, N>
where
    U: UserRepository,
    R: RoleRepository,
    S: SessionRepository,
    L: ActivityLogRepository,
    N: NotificationRepository,
{
    pub auth: Arc<AuthService<U, R, S, L>>,
    pub access: Arc<AccessControlService<U, R>>,
    pub activity: Arc<ActivityLogQueryService<L>>,
    pub notifications: Arc<NotificationService<U, R, N, L>>,
    pub role_assignments: Arc<RoleAssignmentService<U, R, L>>,
    pub user_repo: Arc<U>,
    pub token_service: Arc<TokenService>,
    /// 生产环境下 Cookie 追加 Secure 属性
    pub secure_cookies: bool,
}

impl<U, R, S, L, N> Clone for AppState<U, R, S, L, N>
where
    U: UserRepository,
    R: RoleRepository,
    S: SessionRepository,
    L: ActivityLogRepository,
    N: NotificationRepository,
{
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            access: self.access.clone(),
            activity: self.activity.clone(),
            notifications: self.notifications.clone(),
            role_assignments: self.role_assignments.clone(),
            user_repo: self.user_repo.clone(),
            token_service: self.token_service.clone(),
            secure_cookies: self.secure_cookies,
        }
    }
}
