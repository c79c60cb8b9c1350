//! JWT 令牌签发与黑名单

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use iam_auth_core::TokenService;
use iam_errors::{AppError, AppResult};
use iam_ports::CachePort;
use tracing::debug;

use crate::domain::{Client, IssuedToken, TokenIssuer, TokenSubject, User};

/// 令牌黑名单 key 前缀
pub const TOKEN_BLACKLIST_PREFIX: &str = "auth:blacklist:";

const BEARER: &str = "Bearer";

/// 基于 JWT 的令牌签发
///
/// 令牌本身无状态；注销通过把 jti 写入缓存黑名单实现，黑名单条目随令牌一同过期。
pub struct JwtTokenIssuer {
    tokens: TokenService,
    cache: Arc<dyn CachePort>,
}

impl JwtTokenIssuer {
    pub fn new(tokens: TokenService, cache: Arc<dyn CachePort>) -> Self {
        Self { tokens, cache }
    }

    fn blacklist_key(token_id: &str) -> String {
        format!("{}{}", TOKEN_BLACKLIST_PREFIX, token_id)
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, user: &User, client: &Client) -> AppResult<IssuedToken> {
        let expires_in = client
            .timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or_else(|| self.tokens.default_expires_in());

        let (access_token, claims) =
            self.tokens
                .generate_access_token(&user.id, &client.client_id, Some(expires_in))?;
        debug!(user_id = %user.id, jti = %claims.jti, expires_in, "Access token issued");

        Ok(IssuedToken {
            access_token,
            token_type: BEARER.to_string(),
            expires_in,
        })
    }

    async fn validate(&self, token: &str) -> AppResult<TokenSubject> {
        let claims = self.tokens.validate_token(token)?;

        if self.cache.exists(&Self::blacklist_key(&claims.jti)).await? {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(TokenSubject {
            user_id: claims.user_id()?,
            remaining_secs: claims.remaining_secs(),
            client_id: claims.client_id,
            token_id: claims.jti,
        })
    }

    async fn revoke(&self, subject: &TokenSubject) -> AppResult<()> {
        if subject.remaining_secs == 0 {
            return Ok(());
        }
        self.cache
            .set(
                &Self::blacklist_key(&subject.token_id),
                &subject.user_id.to_string(),
                Some(Duration::from_secs(subject.remaining_secs)),
            )
            .await?;
        debug!(jti = %subject.token_id, "Token revoked");
        Ok(())
    }
}
