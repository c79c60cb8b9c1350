//! IAM Engine - 认证授权服务入口

use std::net::SocketAddr;

use iam_config::AppConfig;
use iam_engine::api::http::router;
use iam_engine::bootstrap::{build_state, init_runtime, request_timeout, shutdown_signal};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_runtime(&config);

    let metrics = match iam_telemetry::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
            None
        }
    };

    let state = build_state(&config, metrics).await?;
    let app = router(state).layer(request_timeout(config.server.request_timeout_secs));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service stopped");
    Ok(())
}
