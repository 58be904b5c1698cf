//! 通知仓储接口

use async_trait::async_trait;
use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::AppResult;

use super::notification::{Notification, NotificationId};

/// 通知仓储接口
///
/// 所有读取/变更都以 user_id 为作用域，调用方只能触达自己的通知
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 批量插入通知（按角色扇出时一次写入）
    async fn insert_many(&self, notifications: &[Notification]) -> AppResult<()>;

    /// 按用户分页列出通知（按创建时间倒序）
    async fn list_for_user(
        &self,
        user_id: &UserId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Notification>>;

    /// 未读数量
    async fn unread_count(&self, user_id: &UserId) -> AppResult<u64>;

    /// 标记单条已读，返回更新后的通知；不属于该用户时返回 None
    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> AppResult<Option<Notification>>;

    /// 全部标记已读，返回受影响行数
    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64>;

    /// 删除单条通知，返回是否存在
    async fn delete(&self, id: &NotificationId, user_id: &UserId) -> AppResult<bool>;

    /// 删除所有已读通知，返回删除数量
    async fn delete_read(&self, user_id: &UserId) -> AppResult<u64>;
}
