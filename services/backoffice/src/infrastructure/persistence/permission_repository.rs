//! PostgreSQL 权限目录仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockdesk_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::rbac::{Permission, PermissionAction, PermissionId, PermissionRepository};

use super::map_sqlx_error;

pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    description: String,
    resource: String,
    action: String,
    created_at: DateTime<Utc>,
}

impl PermissionRow {
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

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn upsert_by_name(&self, permission: &Permission) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (id, name, description, resource, action, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                resource = EXCLUDED.resource,
                action = EXCLUDED.action
            RETURNING id, name, description, resource, action, created_at
            "#,
        )
        .bind(permission.id.0)
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(permission.action.as_str())
        .bind(permission.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.into_permission()
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, description, resource, action, created_at
            FROM permissions WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn list_all(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, description, resource, action, created_at
            FROM permissions ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(PermissionRow::into_permission).collect()
    }
}
