//! 外部协作者接口
//!
//! 密码哈希、令牌签发与第三方认证的具体算法不属于引擎

use async_trait::async_trait;
use iam_common::UserId;
use iam_errors::AppResult;
use serde::Serialize;

use super::client::Client;
use super::user::{SocialIdentity, User};

/// 凭证校验
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// 明文与存储的哈希是否匹配
    async fn verify(&self, secret: &str, stored_hash: &str) -> AppResult<bool>;
}

/// 签发的令牌
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// 有效期（秒）
    pub expires_in: i64,
}

/// 令牌校验得到的主体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: UserId,
    pub client_id: String,
    pub token_id: String,
    /// 剩余有效期（秒）
    pub remaining_secs: u64,
}

/// 令牌签发
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, user: &User, client: &Client) -> AppResult<IssuedToken>;

    async fn validate(&self, token: &str) -> AppResult<TokenSubject>;

    /// 使令牌在剩余有效期内失效
    async fn revoke(&self, subject: &TokenSubject) -> AppResult<()>;
}

/// 第三方认证（OAuth 授权码换取身份）
#[async_trait]
pub trait SocialAuthProvider: Send + Sync {
    async fn authenticate(
        &self,
        source: &str,
        code: &str,
        state: Option<&str>,
    ) -> AppResult<SocialIdentity>;
}
