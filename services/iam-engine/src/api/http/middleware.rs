//! 身份上下文中间件
//!
//! 校验 Bearer 令牌后填充请求身份上下文，请求结束时清空；
//! 清空时发现身份仍被引用则以 500 返回，不吞掉错误。

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use iam_errors::AppError;
use tracing::{debug, warn};

use super::response::ApiError;
use super::state::AppState;
use crate::application::context::RequestIdentityContext;
use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

pub async fn identity_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        warn!("Missing or invalid authorization header");
        AuthError::Unauthenticated
    })?;

    // 只有令牌本身被拒才算无效令牌，缓存等故障按服务端错误返回
    let subject = state
        .token_issuer
        .validate(&token)
        .await
        .map_err(|e| match e {
            AppError::Unauthorized(reason) => {
                warn!(reason = %reason, "Token rejected");
                AuthError::InvalidToken(reason)
            }
            other => AuthError::Infrastructure(other),
        })?;
    debug!(user_id = %subject.user_id, client_id = %subject.client_id, "Token validated");

    let context = RequestIdentityContext::new(state.identity_loader.clone(), state.contexts.clone());
    let scope = context.enter(subject)?;
    request.extensions_mut().insert(context);

    let response = next.run(request).await;

    scope.close()?;
    Ok(response)
}
