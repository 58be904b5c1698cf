//! RBAC 目录播种
//!
//! 固定的权限目录与三个基线角色，按唯一名称幂等 upsert，
//! 可重复执行而不产生重复数据

use std::collections::HashMap;
use std::sync::Arc;

use stockdesk_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::rbac::{
    Permission, PermissionAction, PermissionRepository, Role, RoleRepository,
};

/// 注册时分配的默认角色
pub const DEFAULT_ROLE: &str = "user";

/// 操作员角色（全量日志视图、日志删除、角色管理的守卫都挂在它上面）
pub const ADMIN_ROLE: &str = "admin";

/// 播种结果摘要
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub permissions: usize,
    pub roles: usize,
}

/// RBAC 播种器
pub struct RbacSeeder<P, R>
where
    P: PermissionRepository,
    R: RoleRepository,
{
    permission_repo: Arc<P>,
    role_repo: Arc<R>,
}

impl<P, R> RbacSeeder<P, R>
where
    P: PermissionRepository,
    R: RoleRepository,
{
    pub fn new(permission_repo: Arc<P>, role_repo: Arc<R>) -> Self {
        Self {
            permission_repo,
            role_repo,
        }
    }

    /// 执行播种
    pub async fn seed(&self) -> AppResult<SeedSummary> {
        info!("Seeding RBAC catalog");

        let mut by_name: HashMap<String, Permission> = HashMap::new();
        for (resource, action, description) in permission_catalog() {
            let permission = Permission::new(resource, action, description);
            let persisted = self.permission_repo.upsert_by_name(&permission).await?;
            by_name.insert(persisted.name.clone(), persisted);
        }

        let roles = baseline_roles();
        for (name, description, permission_names) in &roles {
            let permissions: Vec<Permission> = permission_names
                .iter()
                .map(|n| {
                    by_name
                        .get(*n)
                        .cloned()
                        .ok_or_else(|| AppError::internal(format!("Missing seeded permission {}", n)))
                })
                .collect::<AppResult<_>>()?;

            match self.role_repo.find_by_name(name).await? {
                Some(mut existing) => {
                    existing.update(*description);
                    existing.set_permissions(permissions);
                    existing.audit_info.update(None);
                    self.role_repo.update(&existing).await?;
                }
                None => {
                    let mut role = Role::new(*name, *description);
                    role.set_permissions(permissions);
                    self.role_repo.create(&role).await?;
                }
            }
            info!(role = name, "Role seeded");
        }

        Ok(SeedSummary {
            permissions: by_name.len(),
            roles: roles.len(),
        })
    }
}

/// 权限目录：user/product/order/role 四种资源各五种操作
fn permission_catalog() -> Vec<(&'static str, PermissionAction, String)> {
    let resources = [
        ("user", "users"),
        ("product", "products"),
        ("order", "orders"),
        ("role", "roles"),
    ];

    let mut catalog = Vec::with_capacity(resources.len() * PermissionAction::ALL.len());
    for (resource, plural) in resources {
        for action in PermissionAction::ALL {
            let description = match action {
                PermissionAction::Manage => format!("Manage all {}", plural),
                other => {
                    let verb = other.as_str();
                    let mut chars = verb.chars();
                    let capitalized = match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    };
                    format!("{} {}", capitalized, plural)
                }
            };
            catalog.push((resource, action, description));
        }
    }
    catalog
}

/// 基线角色及其权限子集
fn baseline_roles() -> Vec<(&'static str, &'static str, Vec<&'static str>)> {
    let full_catalog: Vec<&'static str> = vec![
        "user:create",
        "user:read",
        "user:update",
        "user:delete",
        "user:manage",
        "product:create",
        "product:read",
        "product:update",
        "product:delete",
        "product:manage",
        "order:create",
        "order:read",
        "order:update",
        "order:delete",
        "order:manage",
        "role:create",
        "role:read",
        "role:update",
        "role:delete",
        "role:manage",
    ];

    vec![
        (
            DEFAULT_ROLE,
            "Regular user role",
            vec!["user:read", "product:read", "order:create", "order:read"],
        ),
        (
            "seller",
            "Seller role with product management",
            vec![
                "user:read",
                "product:create",
                "product:read",
                "product:update",
                "product:delete",
                "order:read",
                "order:update",
            ],
        ),
        (ADMIN_ROLE, "Administrator with full access", full_catalog),
    ]
}
