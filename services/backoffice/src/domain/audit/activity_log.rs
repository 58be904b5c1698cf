//! 操作日志实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockdesk_common::UserId;
use uuid::Uuid;

/// 操作日志 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityLogId(pub Uuid);

impl ActivityLogId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ActivityLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActivityLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Read,
    Update,
    Delete,
    Login,
    Logout,
    Register,
    AssignRole,
    RevokeRole,
    ChangePassword,
    Other,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Register => "register",
            Self::AssignRole => "assign_role",
            Self::RevokeRole => "revoke_role",
            Self::ChangePassword => "change_password",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            "register" => Ok(Self::Register),
            "assign_role" => Ok(Self::AssignRole),
            "revoke_role" => Ok(Self::RevokeRole),
            "change_password" => Ok(Self::ChangePassword),
            "other" => Ok(Self::Other),
            other => Err(format!("Unknown activity action: {}", other)),
        }
    }
}

/// 操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityOutcome {
    Success,
    Failed,
    Error,
}

impl Default for ActivityOutcome {
    fn default() -> Self {
        Self::Success
    }
}

impl ActivityOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ActivityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActivityOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown activity outcome: {}", other)),
        }
    }
}

/// 请求来源元数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestOrigin {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// 操作日志条目
///
/// 一经写入不再变更；actor 是弱引用，条目在用户删除后仍保留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: ActivityLogId,
    pub actor: UserId,
    pub action: ActivityAction,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub description: String,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub origin: RequestOrigin,
    pub outcome: ActivityOutcome,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_round_trip() {
        for action in [
            ActivityAction::Create,
            ActivityAction::Login,
            ActivityAction::AssignRole,
            ActivityAction::Other,
        ] {
            let parsed: ActivityAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
        assert!("explode".parse::<ActivityAction>().is_err());
    }

    #[test]
    fn test_outcome_parse_round_trip() {
        for outcome in [
            ActivityOutcome::Success,
            ActivityOutcome::Failed,
            ActivityOutcome::Error,
        ] {
            let parsed: ActivityOutcome = outcome.as_str().parse().unwrap();
            assert_eq!(parsed, outcome);
        }
    }
}
