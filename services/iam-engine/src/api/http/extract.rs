//! 请求身份提取器

use axum::{extract::FromRequestParts, http::request::Parts};

use super::response::ApiError;
use crate::application::context::RequestIdentityContext;
use crate::error::AuthError;

/// 当前请求的身份上下文
///
/// 由 `identity_context_middleware` 放入请求扩展，未经过该中间件的路由提取失败。
pub struct IdentityContext(pub RequestIdentityContext);

impl<S> FromRequestParts<S> for IdentityContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentityContext>()
            .cloned()
            .map(IdentityContext)
            .ok_or(ApiError(AuthError::Unauthenticated))
    }
}
