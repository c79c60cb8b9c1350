use iam_common::RoleId;
use iam_errors::AppError;
use thiserror::Error;

use crate::domain::{AssociationKind, AuthType};

/// 认证授权引擎错误
///
/// 登录链路上的错误都是终止性的，引擎内部不做重试。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unsupported auth type: {0}")]
    UnsupportedAuthType(AuthType),
    #[error("Login payload does not match auth type {expected}")]
    PayloadMismatch { expected: AuthType },
    #[error("Invalid login request: {0}")]
    InvalidRequest(String),
    #[error("Client not found")]
    ClientNotFound,
    #[error("Client is disabled")]
    ClientDisabled,
    #[error("Auth type {0} is not allowed for this client")]
    AuthTypeNotAllowed(AuthType),
    #[error("Captcha expired")]
    CaptchaExpired,
    #[error("Captcha mismatch")]
    CaptchaMismatch,
    #[error("User not found")]
    UserNotFound,
    #[error("User is disabled")]
    UserDisabled,
    #[error("Invalid credentials")]
    CredentialInvalid,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Missing permission: {0}")]
    PermissionDenied(String),
    #[error("Request identity context is already populated")]
    ContextAlreadyPopulated,
    #[error("Request identity context leaked: {0}")]
    ContextLeaked(String),
    #[error("Failed to replace {kind} associations of role {role_id}: {reason}")]
    AssociationReplaceFailed {
        role_id: RoleId,
        kind: AssociationKind,
        reason: String,
    },
    #[error(transparent)]
    Infrastructure(#[from] AppError),
}

impl AuthError {
    /// 稳定的业务错误码，随 Problem Details 返回
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UnsupportedAuthType(_) => "UNSUPPORTED_AUTH_TYPE",
            AuthError::PayloadMismatch { .. } => "PAYLOAD_MISMATCH",
            AuthError::InvalidRequest(_) => "INVALID_REQUEST",
            AuthError::ClientNotFound => "CLIENT_NOT_FOUND",
            AuthError::ClientDisabled => "CLIENT_DISABLED",
            AuthError::AuthTypeNotAllowed(_) => "AUTH_TYPE_NOT_ALLOWED",
            AuthError::CaptchaExpired => "CAPTCHA_EXPIRED",
            AuthError::CaptchaMismatch => "CAPTCHA_MISMATCH",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::UserDisabled => "USER_DISABLED",
            AuthError::CredentialInvalid => "CREDENTIAL_INVALID",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::PermissionDenied(_) => "PERMISSION_DENIED",
            AuthError::ContextAlreadyPopulated => "CONTEXT_ALREADY_POPULATED",
            AuthError::ContextLeaked(_) => "CONTEXT_LEAKED",
            AuthError::AssociationReplaceFailed { .. } => "ASSOCIATION_REPLACE_FAILED",
            AuthError::Infrastructure(_) => "INFRASTRUCTURE",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UnsupportedAuthType(_)
            | AuthError::PayloadMismatch { .. }
            | AuthError::InvalidRequest(_) => AppError::validation(error.to_string()),
            AuthError::ClientNotFound
            | AuthError::ClientDisabled
            | AuthError::AuthTypeNotAllowed(_) => AppError::validation(error.to_string()),
            AuthError::CaptchaExpired
            | AuthError::CaptchaMismatch
            | AuthError::UserNotFound
            | AuthError::CredentialInvalid
            | AuthError::InvalidToken(_)
            | AuthError::Unauthenticated => AppError::unauthorized(error.to_string()),
            AuthError::UserDisabled | AuthError::PermissionDenied(_) => {
                AppError::forbidden(error.to_string())
            }
            AuthError::ContextAlreadyPopulated
            | AuthError::ContextLeaked(_)
            | AuthError::AssociationReplaceFailed { .. } => AppError::internal(error.to_string()),
            AuthError::Infrastructure(e) => e,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
