//! 登录请求

use std::fmt;

use serde::Deserialize;

use crate::domain::AuthType;
use crate::error::{AuthError, AuthResult};

/// 登录请求
///
/// `authType` 决定凭证形态，形如：
/// `{"clientId":"web","authType":"EMAIL","email":"a@b.com","captcha":"123456"}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub client_id: String,
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// 各认证方式的凭证
#[derive(Clone, Deserialize)]
#[serde(tag = "authType", rename_all = "UPPERCASE")]
pub enum Credentials {
    Account {
        username: String,
        password: String,
        /// 图形验证码
        #[serde(default)]
        captcha: Option<String>,
        /// 图形验证码标识
        #[serde(default)]
        uuid: Option<String>,
    },
    Email {
        email: String,
        captcha: String,
    },
    Phone {
        phone: String,
        captcha: String,
    },
    Social {
        source: String,
        code: String,
        #[serde(default)]
        state: Option<String>,
    },
}

impl Credentials {
    pub fn auth_type(&self) -> AuthType {
        match self {
            Credentials::Account { .. } => AuthType::Account,
            Credentials::Email { .. } => AuthType::Email,
            Credentials::Phone { .. } => AuthType::Phone,
            Credentials::Social { .. } => AuthType::Social,
        }
    }
}

// 凭证不得出现在日志中
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Account { username, .. } => f
                .debug_struct("Account")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::Email { email, .. } => f
                .debug_struct("Email")
                .field("email", email)
                .finish_non_exhaustive(),
            Credentials::Phone { phone, .. } => f
                .debug_struct("Phone")
                .field("phone", phone)
                .finish_non_exhaustive(),
            Credentials::Social { source, .. } => f
                .debug_struct("Social")
                .field("source", source)
                .finish_non_exhaustive(),
        }
    }
}

impl LoginRequest {
    pub fn auth_type(&self) -> AuthType {
        self.credentials.auth_type()
    }

    /// 必填字段非空校验
    pub fn validate(&self) -> AuthResult<()> {
        require("clientId", &self.client_id)?;
        match &self.credentials {
            Credentials::Account {
                username, password, ..
            } => {
                require("username", username)?;
                require("password", password)
            }
            Credentials::Email { email, captcha } => {
                require("email", email)?;
                require("captcha", captcha)
            }
            Credentials::Phone { phone, captcha } => {
                require("phone", phone)?;
                require("captcha", captcha)
            }
            Credentials::Social { source, code, .. } => {
                require("source", source)?;
                require("code", code)
            }
        }
    }
}

fn require(field: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidRequest(format!("{} must not be blank", field)));
    }
    Ok(())
}
