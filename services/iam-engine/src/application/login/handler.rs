//! 登录处理器契约

use async_trait::async_trait;

use super::request::Credentials;
use crate::domain::{AuthType, Client, SocialIdentity, User};
use crate::error::{AuthError, AuthResult};

/// 用户解析结果
#[derive(Debug, Clone)]
pub enum UserLookup {
    Found(User),
    /// 第三方身份尚未绑定本系统用户，需要走绑定流程
    BindRequired(SocialIdentity),
}

/// 登录处理器
///
/// 每种认证方式一个实现，`AuthService` 按固定顺序调用：
/// `pre_login` → `resolve_user` → `check_user_status` → `verify_credentials`，之后签发令牌。
#[async_trait]
pub trait LoginHandler: Send + Sync {
    fn auth_type(&self) -> AuthType;

    /// 前置校验（验证码等）
    async fn pre_login(&self, _credentials: &Credentials, _client: &Client) -> AuthResult<()> {
        Ok(())
    }

    async fn resolve_user(&self, credentials: &Credentials) -> AuthResult<UserLookup>;

    async fn check_user_status(&self, user: &User) -> AuthResult<()> {
        if !user.is_enabled() {
            return Err(AuthError::UserDisabled);
        }
        Ok(())
    }

    /// 校验凭证，验证码/第三方方式在 `pre_login`/`resolve_user` 中已完成校验
    async fn verify_credentials(&self, _credentials: &Credentials, _user: &User) -> AuthResult<()> {
        Ok(())
    }
}
