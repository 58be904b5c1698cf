//! 审计记录器
//!
//! 业务操作在确定结果后显式调用；写入失败不回滚、
//! 不阻断触发它的业务操作（fail-open）。

use std::sync::Arc;

use crate::domain::audit::{ActivityLogEntry, ActivityLogRepository};

use super::event::ActivityEvent;

/// 审计记录器
pub struct ActivityRecorder<L>
where
    L: ActivityLogRepository,
{
    log_repo: Arc<L>,
}

impl<L> ActivityRecorder<L>
where
    L: ActivityLogRepository,
{
    pub fn new(log_repo: Arc<L>) -> Self {
        Self { log_repo }
    }

    /// 记录一条审计事件
    ///
    /// 缺失必填字段或写入失败都只在内部留痕并返回 None，
    /// 永远不向调用方抛错
    pub async fn record(&self, event: ActivityEvent) -> Option<ActivityLogEntry> {
        let entry = match event.into_entry() {
            Ok(entry) => entry,
            Err(field) => {
                tracing::error!(
                    missing_field = field,
                    "Activity log entry dropped: missing required field"
                );
                return None;
            }
        };

        match self.log_repo.insert(&entry).await {
            Ok(()) => Some(entry),
            Err(e) => {
                tracing::error!(error = %e, "Failed to write activity log entry");
                None
            }
        }
    }
}
