//! stockdesk-backoffice 服务入口

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use stockdesk_auth_core::TokenService;
use stockdesk_config::AppConfig;
use stockdesk_telemetry::{init_tracing, init_tracing_json};
use tracing::info;

use stockdesk_backoffice::api::{self, AppState};
use stockdesk_backoffice::application::audit::{ActivityLogQueryService, ActivityRecorder};
use stockdesk_backoffice::application::auth::AuthService;
use stockdesk_backoffice::application::authorization::AccessControlService;
use stockdesk_backoffice::application::notification::NotificationService;
use stockdesk_backoffice::application::rbac::{RbacSeeder, RoleAssignmentService};
use stockdesk_backoffice::domain::session::SessionRepository;
use stockdesk_backoffice::infrastructure::persistence::{
    PostgresActivityLogRepository, PostgresNotificationRepository, PostgresPermissionRepository,
    PostgresRoleRepository, PostgresSessionRepository, PostgresUserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;

    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }
    let _metrics_handle = stockdesk_telemetry::init_metrics();

    info!(app = %config.app_name, env = %config.app_env, "Starting backoffice service");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database.url.expose_secret())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // 仓储
    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let role_repo = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let permission_repo = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let session_repo = Arc::new(PostgresSessionRepository::new(pool.clone()));
    let activity_repo = Arc::new(PostgresActivityLogRepository::new(pool.clone()));
    let notification_repo = Arc::new(PostgresNotificationRepository::new(pool.clone()));

    // RBAC 目录播种（幂等，可重复执行）
    let seeder = RbacSeeder::new(permission_repo.clone(), role_repo.clone());
    let summary = seeder.seed().await?;
    info!(
        permissions = summary.permissions,
        roles = summary.roles,
        "RBAC catalog seeded"
    );

    // 清理过期/已吊销的会话
    let removed = session_repo.delete_expired().await?;
    if removed > 0 {
        info!(removed, "Expired sessions removed");
    }

    let token_service = Arc::new(TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.refresh_expires_in,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
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
            notification_repo,
            recorder.clone(),
        )),
        role_assignments: Arc::new(RoleAssignmentService::new(
            user_repo.clone(),
            role_repo,
            recorder,
        )),
        user_repo,
        token_service,
        secure_cookies: config.is_production(),
    };

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
