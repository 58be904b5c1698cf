//! 权限实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 权限 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(pub Uuid);

impl PermissionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 权限操作
///
/// `Manage` 在解析时涵盖同一资源上的其他四种操作，
/// 存储中从不展开
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
    Manage,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 5] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::Manage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

impl std::fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PermissionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "manage" => Ok(Self::Manage),
            other => Err(format!("Unknown permission action: {}", other)),
        }
    }
}

/// 权限实体
///
/// 权限代表对某个资源执行某个操作的许可，
/// 名称全局唯一，形如 "order:read"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    /// 权限名称（唯一标识符，如 "order:read"）
    pub name: String,
    pub description: String,
    pub resource: String,
    pub action: PermissionAction,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(
        resource: impl Into<String>,
        action: PermissionAction,
        description: impl Into<String>,
    ) -> Self {
        let resource = resource.into();
        Self {
            id: PermissionId::new(),
            name: Self::build_name(&resource, action),
            description: description.into(),
            resource,
            action,
            created_at: Utc::now(),
        }
    }

    /// 从资源和操作构造权限名称
    pub fn build_name(resource: &str, action: PermissionAction) -> String {
        format!("{}:{}", resource, action)
    }

    /// 检查是否覆盖给定的资源和操作
    pub fn covers(&self, resource: &str, action: PermissionAction) -> bool {
        self.resource == resource
            && (self.action == action || self.action == PermissionAction::Manage)
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Permission {}
