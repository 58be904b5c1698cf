//! 通知服务
//!
//! 通知的持久化与按角色扇出。投递/推送属于外部协作方，
//! 不在本服务范围内。

use std::sync::Arc;

use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::{AppError, AppResult};
use tracing::warn;

use crate::application::audit::{ActivityEvent, ActivityRecorder};
use crate::domain::audit::{ActivityAction, ActivityLogRepository, RequestOrigin};
use crate::domain::notification::{
    Notification, NotificationId, NotificationPayload, NotificationRepository,
};
use crate::domain::rbac::RoleRepository;
use crate::domain::user::UserRepository;

/// 通知服务
pub struct NotificationService<U, R, N, L>
where
    U: UserRepository,
    R: RoleRepository,
    N: NotificationRepository,
    L: ActivityLogRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    notification_repo: Arc<N>,
    recorder: Arc<ActivityRecorder<L>>,
}

impl<U, R, N, L> NotificationService<U, R, N, L>
where
    U: UserRepository,
    R: RoleRepository,
    N: NotificationRepository,
    L: ActivityLogRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        role_repo: Arc<R>,
        notification_repo: Arc<N>,
        recorder: Arc<ActivityRecorder<L>>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            notification_repo,
            recorder,
        }
    }

    /// 为单个用户创建通知
    pub async fn create_for_user(
        &self,
        actor: &UserId,
        target: UserId,
        payload: NotificationPayload,
        origin: RequestOrigin,
    ) -> AppResult<Notification> {
        let notification = Notification::new(target.clone(), payload);
        self.notification_repo
            .insert_many(std::slice::from_ref(&notification))
            .await?;

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    actor.clone(),
                    ActivityAction::Create,
                    "notification",
                    Some(notification.id.0),
                )
                .with_description(format!("Created notification for user {}", target))
                .with_origin(origin),
            )
            .await;

        Ok(notification)
    }

    /// 为持有任一给定角色的所有用户创建通知
    ///
    /// 扇出再多也只记一条汇总审计条目
    pub async fn create_for_roles(
        &self,
        actor: &UserId,
        role_names: &[&str],
        payload: NotificationPayload,
        origin: RequestOrigin,
    ) -> AppResult<Vec<Notification>> {
        let roles = self.role_repo.find_by_names(role_names).await?;
        if roles.is_empty() {
            warn!(roles = ?role_names, "No roles found for notification fan-out");
            return Ok(Vec::new());
        }

        let role_ids: Vec<_> = roles.into_iter().map(|r| r.id).collect();
        let user_ids = self.user_repo.list_ids_by_role_ids(&role_ids).await?;
        if user_ids.is_empty() {
            warn!(roles = ?role_names, "No users hold the requested roles");
            return Ok(Vec::new());
        }

        let notifications: Vec<Notification> = user_ids
            .into_iter()
            .map(|user_id| Notification::new(user_id, payload.clone()))
            .collect();

        self.notification_repo.insert_many(&notifications).await?;

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    actor.clone(),
                    ActivityAction::Create,
                    "notification",
                    None,
                )
                .with_description(format!(
                    "Created {} notifications for roles {}",
                    notifications.len(),
                    role_names.join(", ")
                ))
                .with_origin(origin),
            )
            .await;

        Ok(notifications)
    }

    /// 本人通知列表
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Notification>> {
        self.notification_repo.list_for_user(user_id, pagination).await
    }

    /// 未读数量
    pub async fn unread_count(&self, user_id: &UserId) -> AppResult<u64> {
        self.notification_repo.unread_count(user_id).await
    }

    /// 标记单条已读
    pub async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
        origin: RequestOrigin,
    ) -> AppResult<Notification> {
        let notification = self
            .notification_repo
            .mark_read(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification not found"))?;

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    user_id.clone(),
                    ActivityAction::Update,
                    "notification",
                    Some(id.0),
                )
                .with_description("Marked notification as read")
                .with_origin(origin),
            )
            .await;

        Ok(notification)
    }

    /// 全部标记已读（批量操作，单条汇总审计）
    pub async fn mark_all_read(&self, user_id: &UserId, origin: RequestOrigin) -> AppResult<u64> {
        let count = self.notification_repo.mark_all_read(user_id).await?;

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    user_id.clone(),
                    ActivityAction::Update,
                    "notification",
                    None,
                )
                .with_description(format!("Marked {} notifications as read", count))
                .with_origin(origin),
            )
            .await;

        Ok(count)
    }

    /// 删除单条通知
    pub async fn delete(
        &self,
        user_id: &UserId,
        id: &NotificationId,
        origin: RequestOrigin,
    ) -> AppResult<()> {
        if !self.notification_repo.delete(id, user_id).await? {
            return Err(AppError::not_found("Notification not found"));
        }

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    user_id.clone(),
                    ActivityAction::Delete,
                    "notification",
                    Some(id.0),
                )
                .with_description("Deleted notification")
                .with_origin(origin),
            )
            .await;

        Ok(())
    }

    /// 删除所有已读通知（批量操作，单条汇总审计）
    pub async fn delete_read(&self, user_id: &UserId, origin: RequestOrigin) -> AppResult<u64> {
        let count = self.notification_repo.delete_read(user_id).await?;

        self.recorder
            .record(
                ActivityEvent::resource_change(
                    user_id.clone(),
                    ActivityAction::Delete,
                    "notification",
                    None,
                )
                .with_description(format!("Deleted {} read notifications", count))
                .with_origin(origin),
            )
            .await;

        Ok(count)
    }
}
