//! RBAC 仓储接口

use async_trait::async_trait;
use stockdesk_errors::AppResult;

use super::permission::Permission;
use super::role::{Role, RoleId};

/// 角色仓储接口
///
/// 角色聚合加载时携带完整的权限集合
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 创建角色
    async fn create(&self, role: &Role) -> AppResult<()>;

    /// 更新角色（含替换权限集合）
    async fn update(&self, role: &Role) -> AppResult<()>;

    /// 根据 ID 查找角色
    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>>;

    /// 根据多个 ID 批量查找角色
    async fn find_by_ids(&self, ids: &[RoleId]) -> AppResult<Vec<Role>>;

    /// 根据唯一名称查找角色
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// 根据多个名称批量查找角色
    async fn find_by_names(&self, names: &[&str]) -> AppResult<Vec<Role>>;

    /// 检查角色名称是否存在
    async fn exists_by_name(&self, name: &str) -> AppResult<bool>;
}

/// 权限目录仓储接口
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// 按唯一名称幂等插入/更新，返回持久化后的权限
    ///
    /// 名称已存在时保留原 ID，只刷新描述等字段
    async fn upsert_by_name(&self, permission: &Permission) -> AppResult<Permission>;

    /// 根据唯一名称查找权限
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// 列出全部权限目录
    async fn list_all(&self) -> AppResult<Vec<Permission>>;
}
