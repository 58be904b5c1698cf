//! 操作日志仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::AppResult;
use uuid::Uuid;

use super::activity_log::{ActivityAction, ActivityLogEntry, ActivityLogId, ActivityOutcome};

/// 日志检索条件
///
/// 时间区间为闭区间 [from, until]；
/// search 对 description 和 resource 做大小写不敏感的子串匹配
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub actor: Option<UserId>,
    pub action: Option<ActivityAction>,
    pub resource: Option<String>,
    pub resource_id: Option<Uuid>,
    pub outcome: Option<ActivityOutcome>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl ActivityLogFilter {
    /// 条目是否满足检索条件
    pub fn matches(&self, entry: &ActivityLogEntry) -> bool {
        if let Some(actor) = &self.actor {
            if &entry.actor != actor {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(resource) = &self.resource {
            if &entry.resource != resource {
                return false;
            }
        }
        if let Some(resource_id) = self.resource_id {
            if entry.resource_id != Some(resource_id) {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if entry.outcome != outcome {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.created_at < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.created_at > until {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_description = entry.description.to_lowercase().contains(&needle);
            let in_resource = entry.resource.to_lowercase().contains(&needle);
            if !in_description && !in_resource {
                return false;
            }
        }
        true
    }
}

/// 操作日志仓储接口
///
/// 只追加；没有更新操作
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// 追加一条日志
    async fn insert(&self, entry: &ActivityLogEntry) -> AppResult<()>;

    /// 根据 ID 查找日志
    async fn find_by_id(&self, id: &ActivityLogId) -> AppResult<Option<ActivityLogEntry>>;

    /// 检索日志（按创建时间倒序分页）
    async fn list(
        &self,
        filter: &ActivityLogFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ActivityLogEntry>>;

    /// 删除单条日志，返回是否存在
    async fn delete(&self, id: &ActivityLogId) -> AppResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::RequestOrigin;

    fn entry(description: &str, resource: &str) -> ActivityLogEntry {
        ActivityLogEntry {
            id: ActivityLogId::new(),
            actor: UserId::new(),
            action: ActivityAction::Update,
            resource: resource.to_string(),
            resource_id: None,
            description: description.to_string(),
            old_data: None,
            new_data: None,
            origin: RequestOrigin::default(),
            outcome: ActivityOutcome::Success,
            error_message: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ActivityLogFilter::default();
        assert!(filter.matches(&entry("updated order", "order")));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let filter = ActivityLogFilter {
            search: Some("ORDER".to_string()),
            ..Default::default()
        };

        assert!(filter.matches(&entry("updated order #42", "order")));
        assert!(filter.matches(&entry("something", "order")));
        assert!(!filter.matches(&entry("touched product", "product")));
    }

    #[test]
    fn test_time_interval_is_closed() {
        let e = entry("x", "order");
        let filter = ActivityLogFilter {
            from: Some(e.created_at),
            until: Some(e.created_at),
            ..Default::default()
        };
        assert!(filter.matches(&e));
    }

    #[test]
    fn test_actor_filter() {
        let e = entry("x", "order");
        let filter = ActivityLogFilter {
            actor: Some(e.actor.clone()),
            ..Default::default()
        };
        assert!(filter.matches(&e));

        let filter = ActivityLogFilter {
            actor: Some(UserId::new()),
            ..Default::default()
        };
        assert!(!filter.matches(&e));
    }
}
