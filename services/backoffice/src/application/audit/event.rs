//! 审计事件
//!
//! 显式的字段结构：actor/action/resource 为必填，
//! 其余可选。缺失必填字段由 Recorder 在运行时拦截。

use serde_json::{Value, json};
use stockdesk_common::UserId;
use uuid::Uuid;

use crate::domain::audit::{
    ActivityAction, ActivityLogEntry, ActivityLogId, ActivityOutcome, RequestOrigin,
};

/// 审计事件
#[derive(Debug, Clone, Default)]
pub struct ActivityEvent {
    // 必填字段
    pub actor: Option<UserId>,
    pub action: Option<ActivityAction>,
    pub resource: Option<String>,
    // 可选字段
    pub resource_id: Option<Uuid>,
    pub description: String,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub origin: RequestOrigin,
    pub outcome: ActivityOutcome,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
}

impl ActivityEvent {
    pub fn new(actor: UserId, action: ActivityAction, resource: impl Into<String>) -> Self {
        Self {
            actor: Some(actor),
            action: Some(action),
            resource: Some(resource.into()),
            ..Default::default()
        }
    }

    /// 认证事件（resource 固定为 "auth"）
    pub fn auth(actor: UserId, action: ActivityAction, description: impl Into<String>) -> Self {
        let mut event = Self::new(actor, action, "auth");
        event.description = description.into();
        event.metadata = Some(json!({ "type": "auth" }));
        event
    }

    /// RBAC 变更事件（resource 固定为 "rbac"）
    pub fn rbac_change(
        actor: UserId,
        action: ActivityAction,
        target_user: Option<&UserId>,
        role_name: &str,
    ) -> Self {
        let mut event = Self::new(actor, action, "rbac");
        event.resource_id = target_user.map(|u| u.0);
        event.description = format!("{} {}", action, role_name);
        event.new_data = Some(json!({
            "target_user_id": target_user.map(|u| u.0.to_string()),
            "role_name": role_name,
        }));
        event.metadata = Some(json!({ "type": "rbac" }));
        event
    }

    /// 通用资源变更事件
    pub fn resource_change(
        actor: UserId,
        action: ActivityAction,
        resource: impl Into<String>,
        resource_id: Option<Uuid>,
    ) -> Self {
        let resource = resource.into();
        let mut event = Self::new(actor, action, resource.clone());
        event.resource_id = resource_id;
        event.metadata = Some(json!({ "type": resource }));
        event
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_snapshots(mut self, old_data: Option<Value>, new_data: Option<Value>) -> Self {
        self.old_data = old_data;
        self.new_data = new_data;
        self
    }

    pub fn with_outcome(mut self, outcome: ActivityOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_error(mut self, error_message: impl Into<String>) -> Self {
        self.outcome = ActivityOutcome::Failed;
        self.error_message = Some(error_message.into());
        self
    }

    /// 转换为日志条目；缺失必填字段时报告字段名
    pub(crate) fn into_entry(self) -> Result<ActivityLogEntry, &'static str> {
        let actor = self.actor.ok_or("actor")?;
        let action = self.action.ok_or("action")?;
        let resource = match self.resource {
            Some(r) if !r.is_empty() => r,
            _ => return Err("resource"),
        };

        Ok(ActivityLogEntry {
            id: ActivityLogId::new(),
            actor,
            action,
            resource,
            resource_id: self.resource_id,
            description: self.description,
            old_data: self.old_data,
            new_data: self.new_data,
            origin: self.origin,
            outcome: self.outcome,
            error_message: self.error_message,
            metadata: self.metadata,
            created_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_entry_with_required_fields() {
        let actor = UserId::new();
        let entry = ActivityEvent::new(actor.clone(), ActivityAction::Update, "order")
            .with_description("updated order")
            .into_entry()
            .unwrap();

        assert_eq!(entry.actor, actor);
        assert_eq!(entry.resource, "order");
        assert_eq!(entry.outcome, ActivityOutcome::Success);
    }

    #[test]
    fn test_missing_required_fields_are_named() {
        let missing_resource = ActivityEvent {
            actor: Some(UserId::new()),
            action: Some(ActivityAction::Update),
            ..Default::default()
        };
        assert_eq!(missing_resource.into_entry().unwrap_err(), "resource");

        let empty_resource = ActivityEvent {
            actor: Some(UserId::new()),
            action: Some(ActivityAction::Update),
            resource: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty_resource.into_entry().unwrap_err(), "resource");

        let missing_actor = ActivityEvent {
            action: Some(ActivityAction::Update),
            resource: Some("order".to_string()),
            ..Default::default()
        };
        assert_eq!(missing_actor.into_entry().unwrap_err(), "actor");
    }

    #[test]
    fn test_auth_event_carries_type_tag() {
        let event = ActivityEvent::auth(UserId::new(), ActivityAction::Login, "logged in");

        assert_eq!(event.resource.as_deref(), Some("auth"));
        assert_eq!(event.metadata, Some(json!({ "type": "auth" })));
    }

    #[test]
    fn test_rbac_event_fills_target_and_tag() {
        let target = UserId::new();
        let event = ActivityEvent::rbac_change(
            UserId::new(),
            ActivityAction::AssignRole,
            Some(&target),
            "seller",
        );

        assert_eq!(event.resource.as_deref(), Some("rbac"));
        assert_eq!(event.resource_id, Some(target.0));
        assert_eq!(event.description, "assign_role seller");
        assert_eq!(event.metadata, Some(json!({ "type": "rbac" })));
    }

    #[test]
    fn test_snapshots_and_outcome_are_carried() {
        let entry = ActivityEvent::new(UserId::new(), ActivityAction::Update, "user")
            .with_snapshots(
                Some(json!({ "email": "old@example.com" })),
                Some(json!({ "email": "new@example.com" })),
            )
            .with_outcome(ActivityOutcome::Error)
            .into_entry()
            .unwrap();

        assert_eq!(entry.old_data, Some(json!({ "email": "old@example.com" })));
        assert_eq!(entry.new_data, Some(json!({ "email": "new@example.com" })));
        assert_eq!(entry.outcome, ActivityOutcome::Error);
    }

    #[test]
    fn test_with_error_marks_failed() {
        let event = ActivityEvent::auth(UserId::new(), ActivityAction::Login, "login attempt")
            .with_error("invalid credentials");

        assert_eq!(event.outcome, ActivityOutcome::Failed);
        assert_eq!(event.error_message.as_deref(), Some("invalid credentials"));
    }
}
