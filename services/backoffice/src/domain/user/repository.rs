//! 用户仓储接口

use async_trait::async_trait;
use stockdesk_common::UserId;
use stockdesk_errors::AppResult;

use super::user::User;
use crate::domain::rbac::RoleId;

/// 用户仓储接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户
    async fn create(&self, user: &User) -> AppResult<()>;

    /// 更新用户（含同步角色引用集合）
    async fn update(&self, user: &User) -> AppResult<()>;

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// 检查用户名是否存在
    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;

    /// 检查邮箱是否存在
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// 列出持有任一给定角色的用户 ID（通知按角色扇出用）
    async fn list_ids_by_role_ids(&self, role_ids: &[RoleId]) -> AppResult<Vec<UserId>>;
}
