//! PostgreSQL 角色仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockdesk_common::{AuditInfo, UserId};
use stockdesk_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::rbac::{
    Permission, PermissionAction, PermissionId, Role, RoleId, RoleRepository,
};

use super::map_sqlx_error;

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 加载单个角色的权限集合
    async fn load_role_permissions(&self, role_id: Uuid) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionJoinRow>(
            r#"
            SELECT p.id, p.name, p.description, p.resource, p.action, p.created_at
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(PermissionJoinRow::into_permission).collect()
    }

    async fn hydrate(&self, row: RoleRow) -> AppResult<Role> {
        let permissions = self.load_role_permissions(row.id).await?;
        row.into_role(permissions)
    }

    /// 替换角色的权限关联
    async fn sync_role_permissions(&self, role: &Role) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role.id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for permission in &role.permissions {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)",
            )
            .bind(role.id.0)
            .bind(permission.id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl RoleRow {
    fn into_role(self, permissions: Vec<Permission>) -> AppResult<Role> {
        Ok(Role {
            id: RoleId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            permissions,
            audit_info: AuditInfo {
                created_at: self.created_at,
                created_by: self.created_by.map(UserId::from_uuid),
                updated_at: self.updated_at,
                updated_by: self.updated_by.map(UserId::from_uuid),
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct PermissionJoinRow {
    id: Uuid,
    name: String,
    description: String,
    resource: String,
    action: String,
    created_at: DateTime<Utc>,
}

impl PermissionJoinRow {
    fn into_permission(self) -> AppResult<Permission> {
        let action: PermissionAction = self
            .action
            .parse()
            .map_err(|e: String| AppError::database(e))?;

        Ok(Permission {
            id: PermissionId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            resource: self.resource,
            action,
            created_at: self.created_at,
        })
    }
}

const ROLE_COLUMNS: &str =
    "id, name, description, is_active, created_at, created_by, updated_at, updated_by";

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create(&self, role: &Role) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, is_active, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id.0)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_active)
        .bind(role.audit_info.created_at)
        .bind(role.audit_info.created_by.as_ref().map(|u| u.0))
        .bind(role.audit_info.updated_at)
        .bind(role.audit_info.updated_by.as_ref().map(|u| u.0))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.sync_role_permissions(role).await
    }

    async fn update(&self, role: &Role) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE roles
            SET description = $2, is_active = $3, updated_at = $4, updated_by = $5
            WHERE id = $1
            "#,
        )
        .bind(role.id.0)
        .bind(&role.description)
        .bind(role.is_active)
        .bind(role.audit_info.updated_at)
        .bind(role.audit_info.updated_by.as_ref().map(|u| u.0))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.sync_role_permissions(role).await
    }

    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE id = $1",
            ROLE_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> AppResult<Vec<Role>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE id = ANY($1)",
            ROLE_COLUMNS
        ))
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            roles.push(self.hydrate(row).await?);
        }
        Ok(roles)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE name = $1",
            ROLE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_names(&self, names: &[&str]) -> AppResult<Vec<Role>> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE name = ANY($1)",
            ROLE_COLUMNS
        ))
        .bind(&names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            roles.push(self.hydrate(row).await?);
        }
        Ok(roles)
    }

    async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(exists)
    }
}
