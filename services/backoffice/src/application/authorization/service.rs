//! 授权检查服务
//!
//! 统一访问控制决策点：角色守卫与权限守卫。
//! 两个守卫都是纯读取，要么放行要么以终止性错误拒绝，
//! 从不变更状态。身份缺失的检查严格先于角色/权限检查
//! （Unauthorized 优先于 Forbidden）。

use std::sync::Arc;

use stockdesk_common::UserId;
use stockdesk_errors::{AppError, AppResult};

use crate::domain::rbac::{PermissionAction, RoleRepository, RoleResolver};
use crate::domain::user::UserRepository;

/// 授权服务
///
/// 每次检查都从存储重新解析角色与权限，
/// 不持有进程内缓存
pub struct AccessControlService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    resolver: RoleResolver<U, R>,
}

impl<U, R> AccessControlService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(user_repo: Arc<U>, role_repo: Arc<R>) -> Self {
        Self {
            resolver: RoleResolver::new(user_repo, role_repo),
        }
    }

    pub fn resolver(&self) -> &RoleResolver<U, R> {
        &self.resolver
    }

    /// 角色守卫：要求持有任一给定角色
    pub async fn require_any_role(
        &self,
        identity: Option<&UserId>,
        role_names: &[&str],
    ) -> AppResult<()> {
        let start = std::time::Instant::now();
        let result = self.check_any_role(identity, role_names).await;
        Self::observe("role", start, &result);
        result
    }

    /// 权限守卫：要求持有 (resource, action) 或 (resource, manage)
    pub async fn require_permission(
        &self,
        identity: Option<&UserId>,
        resource: &str,
        action: PermissionAction,
    ) -> AppResult<()> {
        let start = std::time::Instant::now();
        let result = self.check_permission(identity, resource, action).await;
        Self::observe("permission", start, &result);
        result
    }

    async fn check_any_role(
        &self,
        identity: Option<&UserId>,
        role_names: &[&str],
    ) -> AppResult<()> {
        let user_id = Self::require_identity(identity)?;

        let allowed = self
            .resolver
            .has_any_role(user_id, role_names)
            .await
            .map_err(Self::map_missing_principal)?;

        if !allowed {
            return Err(AppError::forbidden("Insufficient role permissions"));
        }

        Ok(())
    }

    async fn check_permission(
        &self,
        identity: Option<&UserId>,
        resource: &str,
        action: PermissionAction,
    ) -> AppResult<()> {
        let user_id = Self::require_identity(identity)?;

        let effective = self
            .resolver
            .resolve_effective_permissions(user_id)
            .await
            .map_err(Self::map_missing_principal)?;

        if !effective.allows(resource, action) {
            return Err(AppError::forbidden(format!(
                "No permission to {} {}",
                action, resource
            )));
        }

        Ok(())
    }

    /// 身份缺失先于一切角色/权限判断
    fn require_identity(identity: Option<&UserId>) -> AppResult<&UserId> {
        identity.ok_or_else(|| AppError::unauthorized("Authentication required"))
    }

    /// 令牌签发后用户记录被删除：身份断言不再指向有效主体
    fn map_missing_principal(err: AppError) -> AppError {
        match err {
            AppError::NotFound(_) => AppError::unauthorized("User not found"),
            other => other,
        }
    }

    fn observe(guard: &'static str, start: std::time::Instant, result: &AppResult<()>) {
        use metrics::{counter, histogram};

        let allowed = if result.is_ok() { "true" } else { "false" };
        counter!("authorization_checks_total", "guard" => guard, "allowed" => allowed)
            .increment(1);
        histogram!("authorization_check_duration_ms")
            .record(start.elapsed().as_millis() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rbac::{Permission, Role, RoleId};
    use crate::domain::user::{HashedPassword, User};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // --- Mocks ---

    struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, user: &User) -> AppResult<()> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }
        async fn update(&self, user: &User) -> AppResult<()> {
            let mut users = self.users.lock().unwrap();
            if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
                *existing = user.clone();
            }
            Ok(())
        }
        async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned())
        }
        async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }
        async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.username == username))
        }
        async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
            Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
        }
        async fn list_ids_by_role_ids(&self, role_ids: &[RoleId]) -> AppResult<Vec<UserId>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.role_ids.iter().any(|r| role_ids.contains(r)))
                .map(|u| u.id.clone())
                .collect())
        }
    }

    struct MockRoleRepository {
        roles: Mutex<Vec<Role>>,
    }

    #[async_trait]
    impl RoleRepository for MockRoleRepository {
        async fn create(&self, role: &Role) -> AppResult<()> {
            self.roles.lock().unwrap().push(role.clone());
            Ok(())
        }
        async fn update(&self, role: &Role) -> AppResult<()> {
            let mut roles = self.roles.lock().unwrap();
            if let Some(existing) = roles.iter_mut().find(|r| r.id == role.id) {
                *existing = role.clone();
            }
            Ok(())
        }
        async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .find(|r| &r.id == id)
                .cloned())
        }
        async fn find_by_ids(&self, ids: &[RoleId]) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect())
        }
        async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.name == name)
                .cloned())
        }
        async fn find_by_names(&self, names: &[&str]) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .filter(|r| names.contains(&r.name.as_str()))
                .cloned()
                .collect())
        }
        async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
            Ok(self.roles.lock().unwrap().iter().any(|r| r.name == name))
        }
    }

    fn seller_role() -> Role {
        let mut role = Role::new("seller", "Seller role with product management");
        for action in [
            PermissionAction::Create,
            PermissionAction::Read,
            PermissionAction::Update,
            PermissionAction::Delete,
        ] {
            role.add_permission(Permission::new("product", action, ""));
        }
        role.add_permission(Permission::new("order", PermissionAction::Read, ""));
        role.add_permission(Permission::new("order", PermissionAction::Update, ""));
        role
    }

    fn user_with_role(role: &Role) -> User {
        let mut user = User::new(
            "bob",
            "bob@example.com",
            HashedPassword::from_hash("$argon2id$fake".to_string()),
        );
        user.assign_role(role.id.clone());
        user
    }

    fn service(
        users: Vec<User>,
        roles: Vec<Role>,
    ) -> AccessControlService<MockUserRepository, MockRoleRepository> {
        AccessControlService::new(
            Arc::new(MockUserRepository {
                users: Mutex::new(users),
            }),
            Arc::new(MockRoleRepository {
                roles: Mutex::new(roles),
            }),
        )
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized_not_forbidden() {
        let service = service(vec![], vec![]);

        let err = service
            .require_any_role(None, &["admin"])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = service
            .require_permission(None, "order", PermissionAction::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_identity_without_role_is_forbidden() {
        let role = seller_role();
        let user = user_with_role(&role);
        let user_id = user.id.clone();

        let service = service(vec![user], vec![role]);

        let err = service
            .require_any_role(Some(&user_id), &["admin"])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        assert!(
            service
                .require_any_role(Some(&user_id), &["admin", "seller"])
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_seller_scenario() {
        let role = seller_role();
        let user = user_with_role(&role);
        let user_id = user.id.clone();

        let service = service(vec![user], vec![role]);

        // order:delete 不在 seller 的权限集合里
        let err = service
            .require_permission(Some(&user_id), "order", PermissionAction::Delete)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // product:update 放行
        assert!(
            service
                .require_permission(Some(&user_id), "product", PermissionAction::Update)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_manage_satisfies_crud_permission_checks() {
        let mut role = Role::new("admin", "");
        role.add_permission(Permission::new("user", PermissionAction::Manage, ""));
        let user = user_with_role(&role);
        let user_id = user.id.clone();

        let service = service(vec![user], vec![role]);

        for action in [
            PermissionAction::Create,
            PermissionAction::Read,
            PermissionAction::Update,
            PermissionAction::Delete,
        ] {
            assert!(
                service
                    .require_permission(Some(&user_id), "user", action)
                    .await
                    .is_ok()
            );
        }
    }

    #[tokio::test]
    async fn test_role_deactivation_takes_effect_immediately() {
        let mut role = Role::new("admin", "");
        role.add_permission(Permission::new("user", PermissionAction::Manage, ""));
        let user = user_with_role(&role);
        let user_id = user.id.clone();

        let role_repo = Arc::new(MockRoleRepository {
            roles: Mutex::new(vec![role.clone()]),
        });
        let service = AccessControlService::new(
            Arc::new(MockUserRepository {
                users: Mutex::new(vec![user]),
            }),
            role_repo.clone(),
        );

        assert!(
            service
                .require_permission(Some(&user_id), "user", PermissionAction::Read)
                .await
                .is_ok()
        );

        // 授权后停用角色；下一次检查即生效
        let mut deactivated = role;
        deactivated.deactivate();
        role_repo.update(&deactivated).await.unwrap();

        let err = service
            .require_permission(Some(&user_id), "user", PermissionAction::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_deleted_principal_is_unauthorized() {
        let service = service(vec![], vec![]);
        let ghost = UserId::new();

        let err = service
            .require_any_role(Some(&ghost), &["admin"])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = service
            .require_permission(Some(&ghost), "order", PermissionAction::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
