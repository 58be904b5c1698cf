//! 日志检索服务

use std::sync::Arc;

use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::{AppError, AppResult};

use crate::domain::audit::{
    ActivityLogEntry, ActivityLogFilter, ActivityLogId, ActivityLogRepository,
};

/// 日志检索服务
///
/// 全量视图和单条删除由调用点的角色守卫把关；
/// 本人视图强制把 actor 锁定为调用者，无需额外权限
pub struct ActivityLogQueryService<L>
where
    L: ActivityLogRepository,
{
    log_repo: Arc<L>,
}

impl<L> ActivityLogQueryService<L>
where
    L: ActivityLogRepository,
{
    pub fn new(log_repo: Arc<L>) -> Self {
        Self { log_repo }
    }

    /// 全量检索（操作员视图）
    pub async fn list(
        &self,
        filter: &ActivityLogFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ActivityLogEntry>> {
        self.log_repo.list(filter, pagination).await
    }

    /// 本人日志检索（自助视图）
    pub async fn list_for_actor(
        &self,
        actor: &UserId,
        mut filter: ActivityLogFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ActivityLogEntry>> {
        filter.actor = Some(actor.clone());
        self.log_repo.list(&filter, pagination).await
    }

    /// 单条详情
    pub async fn get(&self, id: &ActivityLogId) -> AppResult<ActivityLogEntry> {
        self.log_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Activity log entry not found"))
    }

    /// 删除单条日志
    pub async fn delete(&self, id: &ActivityLogId) -> AppResult<()> {
        if !self.log_repo.delete(id).await? {
            return Err(AppError::not_found("Activity log entry not found"));
        }
        Ok(())
    }
}
