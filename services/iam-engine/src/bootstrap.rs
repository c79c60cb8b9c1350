//! 服务装配与运行时

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use iam_adapter_postgres::{PostgresConfig, create_pool};
use iam_adapter_redis::{RedisCache, create_connection_manager};
use iam_auth_core::TokenService;
use iam_common::UserId;
use iam_config::AppConfig;
use iam_errors::AppResult;
use iam_ports::CachePort;
use iam_telemetry::{init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::api::http::{AppState, HealthIndicator, PostgresHealth, RedisHealth};
use crate::application::authorization::{DataScopeResolver, PermissionAggregator, SuperAdmin};
use crate::application::context::{ContextTracker, IdentityResolver};
use crate::application::login::{
    AccountLoginHandler, AuthService, EmailLoginHandler, LoginCodeStore, LoginStrategyRegistry,
    PhoneLoginHandler, SocialLoginHandler,
};
use crate::domain::{AuthType, OrgUnitDirectory, TokenIssuer};
use crate::infrastructure::persistence::{
    PostgresAssociationStore, PostgresClientRepository, PostgresDeptRepository,
    PostgresMenuRepository, PostgresRoleRepository, PostgresUserRepository,
};
use crate::infrastructure::security::{
    Argon2CredentialVerifier, JwtTokenIssuer, NoopSocialAuthProvider,
};

/// 初始化日志
pub fn init_runtime(config: &AppConfig) {
    if config.is_production() || config.telemetry.json {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}

/// 等待关闭信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// 连接外部依赖并装配所有组件
pub async fn build_state(config: &AppConfig, metrics: Option<PrometheusHandle>) -> AppResult<AppState> {
    let pg_config = PostgresConfig::new(config.database.url.expose_secret())
        .with_max_connections(config.database.max_connections);
    let pool = create_pool(&pg_config).await?;

    let mut redis_conn = create_connection_manager(config.redis.url.expose_secret()).await?;
    iam_adapter_redis::check_connection(&mut redis_conn).await?;
    let redis_cache = RedisCache::new(redis_conn);
    let cache: Arc<dyn CachePort> = Arc::new(redis_cache.clone());
    info!("Redis connection created");

    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let roles = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let org_units: Arc<dyn OrgUnitDirectory> = Arc::new(PostgresDeptRepository::new(pool.clone()));
    let menus = Arc::new(PostgresMenuRepository::new(pool.clone()));
    let clients = Arc::new(PostgresClientRepository::new(pool.clone()));
    let associations = Arc::new(PostgresAssociationStore::new(pool.clone()));

    let tokens = TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    );
    let token_issuer: Arc<dyn TokenIssuer> = Arc::new(JwtTokenIssuer::new(tokens, cache.clone()));

    let codes = Arc::new(LoginCodeStore::new(
        cache,
        Duration::from_secs(config.auth.login_code_ttl_secs),
        Duration::from_secs(config.auth.captcha_ttl_secs),
    ));
    let registry = LoginStrategyRegistry::builder()
        .register(
            AuthType::Account,
            Arc::new(AccountLoginHandler::new(
                users.clone(),
                Arc::new(Argon2CredentialVerifier::new()),
                codes.clone(),
                config.auth.captcha_enabled,
            )),
        )
        .register(
            AuthType::Email,
            Arc::new(EmailLoginHandler::new(users.clone(), codes.clone())),
        )
        .register(
            AuthType::Phone,
            Arc::new(PhoneLoginHandler::new(users.clone(), codes)),
        )
        .register(
            AuthType::Social,
            Arc::new(SocialLoginHandler::new(
                users.clone(),
                users.clone(),
                Arc::new(NoopSocialAuthProvider),
            )),
        )
        .build()?;
    registry.ensure_complete()?;

    let super_admin = SuperAdmin(UserId(config.auth.super_admin_user_id));
    let data_scope = Arc::new(DataScopeResolver::new(org_units.clone(), super_admin));
    let permissions = Arc::new(PermissionAggregator::new(menus, associations, super_admin));
    let identity_resolver = Arc::new(IdentityResolver::new(
        users,
        roles,
        data_scope,
        permissions.clone(),
        config.auth.password_expiry_days,
    ));

    let auth_service = Arc::new(AuthService::new(Arc::new(registry), clients, token_issuer.clone()));

    let health_indicators: Vec<Arc<dyn HealthIndicator>> = vec![
        Arc::new(PostgresHealth(pool)),
        Arc::new(RedisHealth(redis_cache)),
    ];

    info!("Auth engine components wired");

    Ok(AppState {
        auth_service,
        token_issuer,
        identity_loader: identity_resolver,
        permissions,
        org_units,
        contexts: ContextTracker::new(),
        health_indicators,
        metrics,
    })
}

/// 请求超时层，超时返回 408
pub fn request_timeout(secs: u64) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(secs))
}
