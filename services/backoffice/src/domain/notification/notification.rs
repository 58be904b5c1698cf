//! 通知实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockdesk_common::UserId;
use uuid::Uuid;

/// 通知 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Product,
    Order,
    User,
    System,
    Info,
    Warning,
    Error,
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::Info
    }
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Order => "order",
            Self::User => "user",
            Self::System => "system",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "order" => Ok(Self::Order),
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown notification kind: {}", other)),
        }
    }
}

/// 通知载荷（创建通知时的内容部分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    pub resource: Option<String>,
    pub resource_id: Option<Uuid>,
    pub action_url: Option<String>,
    pub metadata: Option<Value>,
}

/// 通知实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub resource: Option<String>,
    pub resource_id: Option<Uuid>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: UserId, payload: NotificationPayload) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            title: payload.title,
            message: payload.message,
            kind: payload.kind,
            resource: payload.resource,
            resource_id: payload.resource_id,
            action_url: payload.action_url,
            is_read: false,
            read_at: None,
            metadata: payload.metadata,
            created_at: Utc::now(),
        }
    }

    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "New product".to_string(),
            message: "Product X was added".to_string(),
            kind: NotificationKind::Product,
            resource: Some("product".to_string()),
            resource_id: None,
            action_url: None,
            metadata: None,
        }
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(UserId::new(), payload());

        assert!(!n.is_read);
        assert!(n.read_at.is_none());
    }

    #[test]
    fn test_mark_read_sets_timestamp_once() {
        let mut n = Notification::new(UserId::new(), payload());

        n.mark_read();
        let first = n.read_at;
        assert!(n.is_read);
        assert!(first.is_some());

        n.mark_read();
        assert_eq!(n.read_at, first);
    }
}
