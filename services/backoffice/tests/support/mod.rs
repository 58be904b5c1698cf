//! 集成测试用的内存仓储

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stockdesk_auth_core::TokenService;
use stockdesk_common::{PagedResult, Pagination, UserId};
use stockdesk_errors::AppResult;

use stockdesk_backoffice::api::AppState;
use stockdesk_backoffice::application::audit::{ActivityLogQueryService, ActivityRecorder};
use stockdesk_backoffice::application::auth::AuthService;
use stockdesk_backoffice::application::authorization::AccessControlService;
use stockdesk_backoffice::application::notification::NotificationService;
use stockdesk_backoffice::application::rbac::{RbacSeeder, RoleAssignmentService};
use stockdesk_backoffice::domain::audit::{
    ActivityLogEntry, ActivityLogFilter, ActivityLogId, ActivityLogRepository,
};
use stockdesk_backoffice::domain::notification::{
    Notification, NotificationId, NotificationRepository,
};
use stockdesk_backoffice::domain::rbac::{
    Permission, PermissionRepository, Role, RoleId, RoleRepository,
};
use stockdesk_backoffice::domain::session::{Session, SessionId, SessionRepository};
use stockdesk_backoffice::domain::user::{User, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    pub users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }
    async fn update(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.id == id)
            .cloned())
    }
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username))
    }
    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
    }
    async fn list_ids_by_role_ids(&self, role_ids: &[RoleId]) -> AppResult<Vec<UserId>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role_ids.iter().any(|r| role_ids.contains(r)))
            .map(|u| u.id.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryRoleRepository {
    pub roles: Mutex<Vec<Role>>,
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, role: &Role) -> AppResult<()> {
        self.roles.lock().unwrap().push(role.clone());
        Ok(())
    }
    async fn update(&self, role: &Role) -> AppResult<()> {
        let mut roles = self.roles.lock().unwrap();
        if let Some(existing) = roles.iter_mut().find(|r| r.id == role.id) {
            *existing = role.clone();
        }
        Ok(())
    }
    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .cloned())
    }
    async fn find_by_ids(&self, ids: &[RoleId]) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }
    async fn find_by_names(&self, names: &[&str]) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| names.contains(&r.name.as_str()))
            .cloned()
            .collect())
    }
    async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
        Ok(self.roles.lock().unwrap().iter().any(|r| r.name == name))
    }
}

#[derive(Default)]
pub struct InMemoryPermissionRepository {
    pub permissions: Mutex<Vec<Permission>>,
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn upsert_by_name(&self, permission: &Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().unwrap();
        if let Some(existing) = permissions.iter_mut().find(|p| p.name == permission.name) {
            existing.description = permission.description.clone();
            existing.resource = permission.resource.clone();
            existing.action = permission.action;
            return Ok(existing.clone());
        }
        permissions.push(permission.clone());
        Ok(permission.clone())
    }
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }
    async fn list_all(&self) -> AppResult<Vec<Permission>> {
        Ok(self.permissions.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    pub sessions: Mutex<Vec<Session>>,
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> AppResult<()> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.refresh_token_hash == token_hash)
            .cloned())
    }
    async fn revoke(&self, id: &SessionId) -> AppResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| &s.id == id) {
            session.revoke();
        }
        Ok(())
    }
    async fn delete_expired(&self) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.is_valid());
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryActivityLogRepository {
    pub entries: Mutex<Vec<ActivityLogEntry>>,
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn insert(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
    async fn find_by_id(&self, id: &ActivityLogId) -> AppResult<Option<ActivityLogEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| &e.id == id)
            .cloned())
    }
    async fn list(
        &self,
        filter: &ActivityLogFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ActivityLogEntry>> {
        let mut matching: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page: Vec<_> = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect();

        Ok(PagedResult::new(page, total, pagination))
    }
    async fn delete(&self, id: &ActivityLogId) -> AppResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        Ok(entries.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    pub notifications: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert_many(&self, notifications: &[Notification]) -> AppResult<()> {
        self.notifications
            .lock()
            .unwrap()
            .extend_from_slice(notifications);
        Ok(())
    }
    async fn list_for_user(
        &self,
        user_id: &UserId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Notification>> {
        let mut mine: Vec<_> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = mine.len() as u64;
        let page: Vec<_> = mine
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect();

        Ok(PagedResult::new(page, total, pagination))
    }
    async fn unread_count(&self, user_id: &UserId) -> AppResult<u64> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| &n.user_id == user_id && !n.is_read)
            .count() as u64)
    }
    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> AppResult<Option<Notification>> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications
            .iter_mut()
            .find(|n| &n.id == id && &n.user_id == user_id)
        {
            Some(notification) => {
                notification.mark_read();
                Ok(Some(notification.clone()))
            }
            None => Ok(None),
        }
    }
    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64> {
        let mut notifications = self.notifications.lock().unwrap();
        let mut count = 0;
        for notification in notifications
            .iter_mut()
            .filter(|n| &n.user_id == user_id && !n.is_read)
        {
            notification.mark_read();
            count += 1;
        }
        Ok(count)
    }
    async fn delete(&self, id: &NotificationId, user_id: &UserId) -> AppResult<bool> {
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !(&n.id == id && &n.user_id == user_id));
        Ok(notifications.len() != before)
    }
    async fn delete_read(&self, user_id: &UserId) -> AppResult<u64> {
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !(&n.user_id == user_id && n.is_read));
        Ok((before - notifications.len()) as u64)
    }
}

/// 内存仓储的类型别名
pub type MemoryState = AppState<
    InMemoryUserRepository,
    InMemoryRoleRepository,
    InMemorySessionRepository,
    InMemoryActivityLogRepository,
    InMemoryNotificationRepository,
>;

pub struct TestEnv {
    pub user_repo: Arc<InMemoryUserRepository>,
    pub role_repo: Arc<InMemoryRoleRepository>,
    pub permission_repo: Arc<InMemoryPermissionRepository>,
    pub session_repo: Arc<InMemorySessionRepository>,
    pub activity_repo: Arc<InMemoryActivityLogRepository>,
    pub notification_repo: Arc<InMemoryNotificationRepository>,
    pub token_service: Arc<TokenService>,
    pub state: MemoryState,
}

/// 构建完整的内存环境并播种 RBAC 目录
pub async fn test_env() -> TestEnv {
    let user_repo = Arc::new(InMemoryUserRepository::default());
    let role_repo = Arc::new(InMemoryRoleRepository::default());
    let permission_repo = Arc::new(InMemoryPermissionRepository::default());
    let session_repo = Arc::new(InMemorySessionRepository::default());
    let activity_repo = Arc::new(InMemoryActivityLogRepository::default());
    let notification_repo = Arc::new(InMemoryNotificationRepository::default());

    RbacSeeder::new(permission_repo.clone(), role_repo.clone())
        .seed()
        .await
        .expect("seeding must succeed");

    let token_service = Arc::new(TokenService::new(
        "integration_test_secret",
        900,
        604800,
        "stockdesk".to_string(),
        "stockdesk-api".to_string(),
    ));

    let recorder = Arc::new(ActivityRecorder::new(activity_repo.clone()));

    let state = AppState {
        auth: Arc::new(AuthService::new(
            user_repo.clone(),
            role_repo.clone(),
            session_repo.clone(),
            recorder.clone(),
            token_service.clone(),
        )),
        access: Arc::new(AccessControlService::new(
            user_repo.clone(),
            role_repo.clone(),
        )),
        activity: Arc::new(ActivityLogQueryService::new(activity_repo.clone())),
        notifications: Arc::new(NotificationService::new(
            user_repo.clone(),
            role_repo.clone(),
            notification_repo.clone(),
            recorder.clone(),
        )),
        role_assignments: Arc::new(RoleAssignmentService::new(
            user_repo.clone(),
            role_repo.clone(),
            recorder,
        )),
        user_repo: user_repo.clone(),
        token_service: token_service.clone(),
        secure_cookies: false,
    };

    TestEnv {
        user_repo,
        role_repo,
        permission_repo,
        session_repo,
        activity_repo,
        notification_repo,
        token_service,
        state,
    }
}
