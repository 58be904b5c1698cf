//! 角色解析服务
//!
//! 将用户的角色引用展平为有效权限集合。
//! 每次请求都从存储解析，不做进程内缓存，
//! 保证角色/权限变更在下一个请求立即生效。

use std::collections::HashSet;
use std::sync::Arc;

use stockdesk_common::UserId;
use stockdesk_errors::{AppError, AppResult};

use super::permission::PermissionAction;
use super::repository::RoleRepository;
use crate::domain::user::UserRepository;

/// 有效权限集合
///
/// 跨角色去重后的 (resource, action) 集合。
/// `manage` 的涵盖规则在查询时求值，集合本身不存展开项。
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    entries: HashSet<(String, PermissionAction)>,
}

impl EffectivePermissions {
    pub fn insert(&mut self, resource: impl Into<String>, action: PermissionAction) {
        self.entries.insert((resource.into(), action));
    }

    /// 是否允许对资源执行操作
    ///
    /// 精确匹配，或同一资源上持有 manage
    pub fn allows(&self, resource: &str, action: PermissionAction) -> bool {
        self.entries.contains(&(resource.to_string(), action))
            || self
                .entries
                .contains(&(resource.to_string(), PermissionAction::Manage))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 角色解析服务
pub struct RoleResolver<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
}

impl<U, R> RoleResolver<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(user_repo: Arc<U>, role_repo: Arc<R>) -> Self {
        Self {
            user_repo,
            role_repo,
        }
    }

    /// 解析用户的有效权限集合
    ///
    /// 停用角色的权限被排除；用户记录不存在时返回 NotFound
    /// （例如在令牌签发与使用之间被删除）
    pub async fn resolve_effective_permissions(
        &self,
        user_id: &UserId,
    ) -> AppResult<EffectivePermissions> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let roles = self.role_repo.find_by_ids(&user.role_ids).await?;

        let mut effective = EffectivePermissions::default();
        for role in roles.iter().filter(|r| r.is_active) {
            for permission in &role.permissions {
                effective.insert(permission.resource.clone(), permission.action);
            }
        }

        Ok(effective)
    }

    /// 用户的激活角色名称
    pub async fn active_role_names(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let roles = self.role_repo.find_by_ids(&user.role_ids).await?;

        Ok(roles
            .into_iter()
            .filter(|r| r.is_active)
            .map(|r| r.name)
            .collect())
    }

    /// 用户是否持有任一给定角色（纯谓词，无副作用）
    pub async fn has_any_role(&self, user_id: &UserId, role_names: &[&str]) -> AppResult<bool> {
        let active = self.active_role_names(user_id).await?;
        Ok(role_names
            .iter()
            .any(|name| active.iter().any(|r| r.as_str() == *name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rbac::{Permission, Role, RoleId};
    use crate::domain::user::{HashedPassword, User};
    use async_trait::async_trait;

    // --- Mocks ---

    struct MockUserRepository {
        users: Vec<User>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, _user: &User) -> AppResult<()> {
            Ok(())
        }
        async fn update(&self, _user: &User) -> AppResult<()> {
            Ok(())
        }
        async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
            Ok(self.users.iter().find(|u| &u.id == id).cloned())
        }
        async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
            Ok(self.users.iter().find(|u| u.username == username).cloned())
        }
        async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
            Ok(self.users.iter().any(|u| u.username == username))
        }
        async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
            Ok(self.users.iter().any(|u| u.email == email))
        }
        async fn list_ids_by_role_ids(&self, role_ids: &[RoleId]) -> AppResult<Vec<UserId>> {
            Ok(self
                .users
                .iter()
                .filter(|u| u.role_ids.iter().any(|r| role_ids.contains(r)))
                .map(|u| u.id.clone())
                .collect())
        }
    }

    struct MockRoleRepository {
        roles: Vec<Role>,
    }

    #[async_trait]
    impl RoleRepository for MockRoleRepository {
        async fn create(&self, _role: &Role) -> AppResult<()> {
            Ok(())
        }
        async fn update(&self, _role: &Role) -> AppResult<()> {
            Ok(())
        }
        async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
            Ok(self.roles.iter().find(|r| &r.id == id).cloned())
        }
        async fn find_by_ids(&self, ids: &[RoleId]) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect())
        }
        async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
            Ok(self.roles.iter().find(|r| r.name == name).cloned())
        }
        async fn find_by_names(&self, names: &[&str]) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .iter()
                .filter(|r| names.contains(&r.name.as_str()))
                .cloned()
                .collect())
        }
        async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
            Ok(self.roles.iter().any(|r| r.name == name))
        }
    }

    fn user_with_roles(roles: &[&Role]) -> User {
        let mut user = User::new(
            "alice",
            "alice@example.com",
            HashedPassword::from_hash("$argon2id$fake".to_string()),
        );
        for role in roles {
            user.assign_role(role.id.clone());
        }
        user
    }

    fn resolver(
        users: Vec<User>,
        roles: Vec<Role>,
    ) -> RoleResolver<MockUserRepository, MockRoleRepository> {
        RoleResolver::new(
            Arc::new(MockUserRepository { users }),
            Arc::new(MockRoleRepository { roles }),
        )
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_inactive_role_contributes_nothing() {
        let mut active_role = Role::new("viewer", "");
        active_role.add_permission(Permission::new("order", PermissionAction::Read, ""));

        let mut inactive_role = Role::new("admin", "");
        inactive_role.add_permission(Permission::new("user", PermissionAction::Manage, ""));
        inactive_role.deactivate();

        let user = user_with_roles(&[&active_role, &inactive_role]);
        let user_id = user.id.clone();

        let resolver = resolver(vec![user], vec![active_role, inactive_role]);
        let effective = resolver
            .resolve_effective_permissions(&user_id)
            .await
            .unwrap();

        assert!(effective.allows("order", PermissionAction::Read));
        assert!(!effective.allows("user", PermissionAction::Read));
        assert_eq!(effective.len(), 1);
    }

    #[tokio::test]
    async fn test_manage_expands_at_query_time() {
        let mut role = Role::new("admin", "");
        role.add_permission(Permission::new("product", PermissionAction::Manage, ""));

        let user = user_with_roles(&[&role]);
        let user_id = user.id.clone();

        let resolver = resolver(vec![user], vec![role]);
        let effective = resolver
            .resolve_effective_permissions(&user_id)
            .await
            .unwrap();

        // 集合里只有 manage 一项，展开发生在查询时
        assert_eq!(effective.len(), 1);
        for action in [
            PermissionAction::Create,
            PermissionAction::Read,
            PermissionAction::Update,
            PermissionAction::Delete,
        ] {
            assert!(effective.allows("product", action));
        }
        assert!(!effective.allows("order", PermissionAction::Read));
    }

    #[tokio::test]
    async fn test_duplicate_permissions_across_roles_deduped() {
        let shared = Permission::new("order", PermissionAction::Read, "");

        let mut role_a = Role::new("support", "");
        role_a.add_permission(shared.clone());

        let mut role_b = Role::new("sales", "");
        role_b.add_permission(shared);
        role_b.add_permission(Permission::new("order", PermissionAction::Update, ""));

        let user = user_with_roles(&[&role_a, &role_b]);
        let user_id = user.id.clone();

        let resolver = resolver(vec![user], vec![role_a, role_b]);
        let effective = resolver
            .resolve_effective_permissions(&user_id)
            .await
            .unwrap();

        assert_eq!(effective.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let resolver = resolver(vec![], vec![]);
        let err = resolver
            .resolve_effective_permissions(&UserId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_has_any_role() {
        let role = Role::new("seller", "");
        let mut inactive = Role::new("admin", "");
        inactive.deactivate();

        let user = user_with_roles(&[&role, &inactive]);
        let user_id = user.id.clone();

        let resolver = resolver(vec![user], vec![role, inactive]);

        assert!(resolver.has_any_role(&user_id, &["seller"]).await.unwrap());
        assert!(
            resolver
                .has_any_role(&user_id, &["admin", "seller"])
                .await
                .unwrap()
        );
        // 停用角色不参与角色成员判断
        assert!(!resolver.has_any_role(&user_id, &["admin"]).await.unwrap());
        assert!(!resolver.has_any_role(&user_id, &["owner"]).await.unwrap());
    }
}
