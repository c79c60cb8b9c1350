//! 第三方认证

use async_trait::async_trait;
use iam_errors::{AppError, AppResult};
use tracing::warn;

use crate::domain::{SocialAuthProvider, SocialIdentity};

/// 未接入任何第三方平台时使用
///
/// 社交登录处理器仍然注册，调用时返回外部服务错误。
#[derive(Debug, Clone, Default)]
pub struct NoopSocialAuthProvider;

#[async_trait]
impl SocialAuthProvider for NoopSocialAuthProvider {
    async fn authenticate(
        &self,
        source: &str,
        _code: &str,
        _state: Option<&str>,
    ) -> AppResult<SocialIdentity> {
        warn!(source, "Social login attempted but no provider is configured");
        Err(AppError::external_service(format!(
            "Social source not configured: {}",
            source
        )))
    }
}
