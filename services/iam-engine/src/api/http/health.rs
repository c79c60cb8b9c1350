//! 健康检查与指标

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use iam_adapter_redis::RedisCache;
use iam_errors::AppResult;
use iam_telemetry::HealthStatus;
use sqlx::PgPool;

use super::state::AppState;

/// 依赖健康检查
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> AppResult<()>;
}

pub struct PostgresHealth(pub PgPool);

#[async_trait]
impl HealthIndicator for PostgresHealth {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> AppResult<()> {
        iam_adapter_postgres::check_connection(&self.0).await
    }
}

pub struct RedisHealth(pub RedisCache);

#[async_trait]
impl HealthIndicator for RedisHealth {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> AppResult<()> {
        self.0.ping().await
    }
}

pub(super) async fn collect(indicators: &[Arc<dyn HealthIndicator>]) -> HealthStatus {
    let mut status = HealthStatus::new();
    for indicator in indicators {
        match indicator.check().await {
            Ok(()) => status.add_check(indicator.name(), true, None),
            Err(e) => status.add_check(indicator.name(), false, Some(e.to_string())),
        }
    }
    status
}

pub(super) async fn health(State(state): State<AppState>) -> Response {
    let status = collect(&state.health_indicators).await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

pub(super) async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_errors::AppError;

    struct Fixed(&'static str, bool);

    #[async_trait]
    impl HealthIndicator for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn check(&self) -> AppResult<()> {
            if self.1 {
                Ok(())
            } else {
                Err(AppError::cache("connection refused"))
            }
        }
    }

    #[tokio::test]
    async fn test_collect_reports_each_dependency() {
        let indicators: Vec<Arc<dyn HealthIndicator>> =
            vec![Arc::new(Fixed("postgres", true)), Arc::new(Fixed("redis", false))];

        let status = collect(&indicators).await;
        assert!(!status.healthy);
        assert_eq!(status.checks.len(), 2);
        assert!(status.checks[0].healthy);
        assert!(status.checks[1].message.is_some());
    }
}
