//! 角色分配处理器

use std::sync::Arc;

use stockdesk_common::UserId;
use stockdesk_errors::{AppError, AppResult};

use crate::application::audit::{ActivityEvent, ActivityRecorder};
use crate::domain::audit::{ActivityAction, ActivityLogRepository, RequestOrigin};
use crate::domain::rbac::RoleRepository;
use crate::domain::user::{User, UserRepository};

/// 角色分配服务
///
/// 分配与移除都按角色名操作且幂等；
/// 实际发生变更时写一条 RBAC 审计事件
pub struct RoleAssignmentService<U, R, L>
where
    U: UserRepository,
    R: RoleRepository,
    L: ActivityLogRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    recorder: Arc<ActivityRecorder<L>>,
}

impl<U, R, L> RoleAssignmentService<U, R, L>
where
    U: UserRepository,
    R: RoleRepository,
    L: ActivityLogRepository,
{
    pub fn new(user_repo: Arc<U>, role_repo: Arc<R>, recorder: Arc<ActivityRecorder<L>>) -> Self {
        Self {
            user_repo,
            role_repo,
            recorder,
        }
    }

    /// 为用户分配角色
    pub async fn assign_role(
        &self,
        actor: &UserId,
        target_user_id: &UserId,
        role_name: &str,
        origin: RequestOrigin,
    ) -> AppResult<User> {
        let role = self
            .role_repo
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role \"{}\" not found", role_name)))?;

        let mut user = self
            .user_repo
            .find_by_id(target_user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if user.assign_role(role.id) {
            user.audit_info.update(Some(actor.clone()));
            self.user_repo.update(&user).await?;

            self.recorder
                .record(
                    ActivityEvent::rbac_change(
                        actor.clone(),
                        ActivityAction::AssignRole,
                        Some(target_user_id),
                        role_name,
                    )
                    .with_origin(origin),
                )
                .await;
        }

        Ok(user)
    }

    /// 移除用户的角色
    pub async fn revoke_role(
        &self,
        actor: &UserId,
        target_user_id: &UserId,
        role_name: &str,
        origin: RequestOrigin,
    ) -> AppResult<User> {
        let role = self
            .role_repo
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role \"{}\" not found", role_name)))?;

        let mut user = self
            .user_repo
            .find_by_id(target_user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if user.remove_role(&role.id) {
            user.audit_info.update(Some(actor.clone()));
            self.user_repo.update(&user).await?;

            self.recorder
                .record(
                    ActivityEvent::rbac_change(
                        actor.clone(),
                        ActivityAction::RevokeRole,
                        Some(target_user_id),
                        role_name,
                    )
                    .with_origin(origin),
                )
                .await;
        }

        Ok(user)
    }
}
