//! HTTP 接口

mod extract;
mod handlers;
mod health;
mod middleware;
mod response;
mod state;

pub use extract::IdentityContext;
pub use health::*;
pub use middleware::identity_context_middleware;
pub use response::ApiError;
pub use state::AppState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

/// 构建路由
///
/// 登录、健康检查与指标无需令牌；其余路由经过身份上下文中间件。
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/user/info", get(handlers::user_info))
        .route("/auth/user/route", get(handlers::user_route))
        .route(
            "/system/role/{id}/permission",
            put(handlers::update_role_permission),
        )
        .route("/system/role/{id}/dept", put(handlers::update_role_dept))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            identity_context_middleware,
        ));

    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
