//! 用户实体

use serde::{Deserialize, Serialize};
use stockdesk_common::{AuditInfo, UserId};

use super::password::HashedPassword;
use crate::domain::rbac::RoleId;

/// 用户实体
///
/// 角色以引用方式持有（RoleId 集合），不内嵌角色数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: HashedPassword,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub role_ids: Vec<RoleId>,
    pub is_active: bool,
    pub audit_info: AuditInfo,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: HashedPassword,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            first_name: None,
            last_name: None,
            phone_number: None,
            address: None,
            role_ids: Vec::new(),
            is_active: true,
            audit_info: AuditInfo::default(),
        }
    }

    /// 分配角色（幂等：重复分配不产生重复引用）
    pub fn assign_role(&mut self, role_id: RoleId) -> bool {
        if self.role_ids.contains(&role_id) {
            return false;
        }
        self.role_ids.push(role_id);
        true
    }

    /// 移除角色
    pub fn remove_role(&mut self, role_id: &RoleId) -> bool {
        let before = self.role_ids.len();
        self.role_ids.retain(|id| id != role_id);
        self.role_ids.len() != before
    }

    pub fn has_role_id(&self, role_id: &RoleId) -> bool {
        self.role_ids.contains(role_id)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn update_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
    }
}
