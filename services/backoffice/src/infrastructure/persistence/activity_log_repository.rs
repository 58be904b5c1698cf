//! PostgreSQL 操作日志仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::audit::{
    ActivityAction, ActivityLogEntry, ActivityLogFilter, ActivityLogId, ActivityLogRepository,
    ActivityOutcome, RequestOrigin,
};

use super::map_sqlx_error;

pub struct PostgresActivityLogRepository {
    pool: PgPool,
}

impl PostgresActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityLogRow {
    id: Uuid,
    actor_id: Uuid,
    action: String,
    resource: String,
    resource_id: Option<Uuid>,
    description: String,
    old_data: Option<Value>,
    new_data: Option<Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    outcome: String,
    error_message: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl ActivityLogRow {
    fn into_entry(self) -> AppResult<ActivityLogEntry> {
        let action: ActivityAction = self
            .action
            .parse()
            .map_err(|e: String| AppError::database(e))?;
        let outcome: ActivityOutcome = self
            .outcome
            .parse()
            .map_err(|e: String| AppError::database(e))?;

        Ok(ActivityLogEntry {
            id: ActivityLogId::from_uuid(self.id),
            actor: UserId::from_uuid(self.actor_id),
            action,
            resource: self.resource,
            resource_id: self.resource_id,
            description: self.description,
            old_data: self.old_data,
            new_data: self.new_data,
            origin: RequestOrigin {
                ip_address: self.ip_address,
                user_agent: self.user_agent,
            },
            outcome,
            error_message: self.error_message,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

const LOG_COLUMNS: &str = "id, actor_id, action, resource, resource_id, description, old_data, \
     new_data, ip_address, user_agent, outcome, error_message, metadata, created_at";

/// 把检索条件追加到 WHERE 子句
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ActivityLogFilter) {
    if let Some(actor) = &filter.actor {
        qb.push(" AND actor_id = ").push_bind(actor.0);
    }
    if let Some(action) = filter.action {
        qb.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(resource) = &filter.resource {
        qb.push(" AND resource = ").push_bind(resource.clone());
    }
    if let Some(resource_id) = filter.resource_id {
        qb.push(" AND resource_id = ").push_bind(resource_id);
    }
    if let Some(outcome) = filter.outcome {
        qb.push(" AND outcome = ").push_bind(outcome.as_str());
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(until) = filter.until {
        qb.push(" AND created_at <= ").push_bind(until);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR resource ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn insert(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, actor_id, action, resource, resource_id, description,
                                       old_data, new_data, ip_address, user_agent, outcome,
                                       error_message, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(entry.id.0)
        .bind(entry.actor.0)
        .bind(entry.action.as_str())
        .bind(&entry.resource)
        .bind(entry.resource_id)
        .bind(&entry.description)
        .bind(&entry.old_data)
        .bind(&entry.new_data)
        .bind(&entry.origin.ip_address)
        .bind(&entry.origin.user_agent)
        .bind(entry.outcome.as_str())
        .bind(&entry.error_message)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ActivityLogId) -> AppResult<Option<ActivityLogEntry>> {
        let row = sqlx::query_as::<_, ActivityLogRow>(&format!(
            "SELECT {} FROM activity_logs WHERE id = $1",
            LOG_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(ActivityLogRow::into_entry).transpose()
    }

    async fn list(
        &self,
        filter: &ActivityLogFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ActivityLogEntry>> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activity_logs WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM activity_logs WHERE 1=1",
            LOG_COLUMNS
        ));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.page_size as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);

        let rows: Vec<ActivityLogRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let entries: Vec<ActivityLogEntry> = rows
            .into_iter()
            .map(ActivityLogRow::into_entry)
            .collect::<AppResult<_>>()?;

        Ok(PagedResult::new(entries, total as u64, pagination))
    }

    async fn delete(&self, id: &ActivityLogId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM activity_logs WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
