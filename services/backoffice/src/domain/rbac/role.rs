//! 角色实体

use serde::{Deserialize, Serialize};
use stockdesk_common::AuditInfo;
use uuid::Uuid;

use super::permission::{Permission, PermissionAction, PermissionId};

/// 角色 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub Uuid);

impl RoleId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 角色实体
///
/// 名称全局唯一；停用的角色即使仍被用户引用，
/// 其权限也不参与解析
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub permissions: Vec<Permission>,
    pub audit_info: AuditInfo,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: description.into(),
            is_active: true,
            permissions: Vec::new(),
            audit_info: AuditInfo::default(),
        }
    }

    /// 添加权限（按权限 ID 去重）
    pub fn add_permission(&mut self, permission: Permission) {
        if !self.permissions.iter().any(|p| p.id == permission.id) {
            self.permissions.push(permission);
        }
    }

    /// 移除权限
    pub fn remove_permission(&mut self, permission_id: &PermissionId) {
        self.permissions.retain(|p| &p.id != permission_id);
    }

    /// 替换整个权限集合（按 ID 去重）
    pub fn set_permissions(&mut self, permissions: Vec<Permission>) {
        self.permissions.clear();
        for permission in permissions {
            self.add_permission(permission);
        }
    }

    /// 检查角色是否持有覆盖给定资源/操作的权限
    pub fn has_permission(&self, resource: &str, action: PermissionAction) -> bool {
        self.permissions.iter().any(|p| p.covers(resource, action))
    }

    /// 激活角色
    pub fn activate(&mut self) {
        self.is_active = true;
    }

    /// 停用角色
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// 更新角色信息
    pub fn update(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}
