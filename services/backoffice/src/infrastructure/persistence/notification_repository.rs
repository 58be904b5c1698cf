//! PostgreSQL 通知仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::notification::{
    Notification, NotificationId, NotificationKind, NotificationRepository,
};

use super::map_sqlx_error;

pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    message: String,
    kind: String,
    resource: Option<String>,
    resource_id: Option<Uuid>,
    action_url: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> AppResult<Notification> {
        let kind: NotificationKind = self
            .kind
            .parse()
            .map_err(|e: String| AppError::database(e))?;

        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            title: self.title,
            message: self.message,
            kind,
            resource: self.resource,
            resource_id: self.resource_id,
            action_url: self.action_url,
            is_read: self.is_read,
            read_at: self.read_at,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, resource, resource_id, \
     action_url, is_read, read_at, metadata, created_at";

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert_many(&self, notifications: &[Notification]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for notification in notifications {
            sqlx::query(
                r#"
                INSERT INTO notifications (id, user_id, title, message, kind, resource,
                                           resource_id, action_url, is_read, read_at, metadata,
                                           created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(notification.id.0)
            .bind(notification.user_id.0)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind.as_str())
            .bind(&notification.resource)
            .bind(notification.resource_id)
            .bind(&notification.action_url)
            .bind(notification.is_read)
            .bind(notification.read_at)
            .bind(&notification.metadata)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Notification>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id.0)
        .bind(pagination.page_size as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let notifications: Vec<Notification> = rows
            .into_iter()
            .map(NotificationRow::into_notification)
            .collect::<AppResult<_>>()?;

        Ok(PagedResult::new(notifications, total as u64, pagination))
    }

    async fn unread_count(&self, user_id: &UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            NOTIFICATION_COLUMNS
        ))
        .bind(id.0)
        .bind(user_id.0)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(NotificationRow::into_notification).transpose()
    }

    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &NotificationId, user_id: &UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_read(&self, user_id: &UserId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
