//! 各认证方式的登录处理器

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::code_store::{CodeChannel, LoginCodeStore};
use super::handler::{LoginHandler, UserLookup};
use super::request::Credentials;
use crate::domain::{
    AuthType, Client, CredentialVerifier, SocialAuthProvider, SocialBindingRepository, User,
    UserRepository,
};
use crate::error::{AuthError, AuthResult};

fn found(user: Option<User>) -> AuthResult<UserLookup> {
    user.map(UserLookup::Found).ok_or(AuthError::UserNotFound)
}

/// 账号密码登录
pub struct AccountLoginHandler {
    users: Arc<dyn UserRepository>,
    verifier: Arc<dyn CredentialVerifier>,
    codes: Arc<LoginCodeStore>,
    captcha_enabled: bool,
}

impl AccountLoginHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        verifier: Arc<dyn CredentialVerifier>,
        codes: Arc<LoginCodeStore>,
        captcha_enabled: bool,
    ) -> Self {
        Self {
            users,
            verifier,
            codes,
            captcha_enabled,
        }
    }
}

#[async_trait]
impl LoginHandler for AccountLoginHandler {
    fn auth_type(&self) -> AuthType {
        AuthType::Account
    }

    async fn pre_login(&self, credentials: &Credentials, _client: &Client) -> AuthResult<()> {
        let Credentials::Account { captcha, uuid, .. } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Account,
            });
        };
        if !self.captcha_enabled {
            return Ok(());
        }
        let (Some(captcha), Some(uuid)) = (captcha.as_deref(), uuid.as_deref()) else {
            return Err(AuthError::InvalidRequest(
                "captcha and uuid are required".to_string(),
            ));
        };
        self.codes.consume(CodeChannel::Captcha, uuid, captcha).await
    }

    async fn resolve_user(&self, credentials: &Credentials) -> AuthResult<UserLookup> {
        let Credentials::Account { username, .. } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Account,
            });
        };
        found(self.users.find_by_username(username.trim()).await?)
    }

    async fn verify_credentials(&self, credentials: &Credentials, user: &User) -> AuthResult<()> {
        let Credentials::Account { password, .. } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Account,
            });
        };
        let Some(hash) = user.password_hash.as_deref() else {
            debug!(user_id = %user.id, "User has no password set");
            return Err(AuthError::CredentialInvalid);
        };
        if !self.verifier.verify(password, hash).await? {
            return Err(AuthError::CredentialInvalid);
        }
        Ok(())
    }
}

/// 邮箱验证码登录
pub struct EmailLoginHandler {
    users: Arc<dyn UserRepository>,
    codes: Arc<LoginCodeStore>,
}

impl EmailLoginHandler {
    pub fn new(users: Arc<dyn UserRepository>, codes: Arc<LoginCodeStore>) -> Self {
        Self { users, codes }
    }
}

#[async_trait]
impl LoginHandler for EmailLoginHandler {
    fn auth_type(&self) -> AuthType {
        AuthType::Email
    }

    async fn pre_login(&self, credentials: &Credentials, _client: &Client) -> AuthResult<()> {
        let Credentials::Email { email, captcha } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Email,
            });
        };
        self.codes.consume(CodeChannel::LoginCode, email, captcha).await
    }

    async fn resolve_user(&self, credentials: &Credentials) -> AuthResult<UserLookup> {
        let Credentials::Email { email, .. } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Email,
            });
        };
        found(self.users.find_by_email(email).await?)
    }
}

/// 手机号验证码登录
pub struct PhoneLoginHandler {
    users: Arc<dyn UserRepository>,
    codes: Arc<LoginCodeStore>,
}

impl PhoneLoginHandler {
    pub fn new(users: Arc<dyn UserRepository>, codes: Arc<LoginCodeStore>) -> Self {
        Self { users, codes }
    }
}

#[async_trait]
impl LoginHandler for PhoneLoginHandler {
    fn auth_type(&self) -> AuthType {
        AuthType::Phone
    }

    async fn pre_login(&self, credentials: &Credentials, _client: &Client) -> AuthResult<()> {
        let Credentials::Phone { phone, captcha } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Phone,
            });
        };
        self.codes.consume(CodeChannel::LoginCode, phone, captcha).await
    }

    async fn resolve_user(&self, credentials: &Credentials) -> AuthResult<UserLookup> {
        let Credentials::Phone { phone, .. } = credentials else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Phone,
            });
        };
        found(self.users.find_by_phone(phone).await?)
    }
}

/// 第三方账号登录
pub struct SocialLoginHandler {
    users: Arc<dyn UserRepository>,
    bindings: Arc<dyn SocialBindingRepository>,
    provider: Arc<dyn SocialAuthProvider>,
}

impl SocialLoginHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bindings: Arc<dyn SocialBindingRepository>,
        provider: Arc<dyn SocialAuthProvider>,
    ) -> Self {
        Self {
            users,
            bindings,
            provider,
        }
    }
}

#[async_trait]
impl LoginHandler for SocialLoginHandler {
    fn auth_type(&self) -> AuthType {
        AuthType::Social
    }

    async fn resolve_user(&self, credentials: &Credentials) -> AuthResult<UserLookup> {
        let Credentials::Social {
            source,
            code,
            state,
        } = credentials
        else {
            return Err(AuthError::PayloadMismatch {
                expected: AuthType::Social,
            });
        };

        let identity = self
            .provider
            .authenticate(source, code, state.as_deref())
            .await?;

        let Some(user_id) = self
            .bindings
            .find_user_id(&identity.source, &identity.open_id)
            .await?
        else {
            debug!(source = %identity.source, "Social identity not bound, bind required");
            return Ok(UserLookup::BindRequired(identity));
        };

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(UserLookup::Found(user)),
            None => {
                warn!(user_id = %user_id, source = %identity.source, "Social binding points to a missing user");
                Err(AuthError::UserNotFound)
            }
        }
    }
}
