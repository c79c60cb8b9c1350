//! 终端（客户端）

use std::collections::BTreeSet;

use iam_common::EnableStatus;

use super::auth_type::AuthType;
use crate::error::{AuthError, AuthResult};

/// 登录终端
///
/// 每次登录都必须指明终端，终端决定允许的认证方式与令牌有效期。
#[derive(Debug, Clone)]
pub struct Client {
    pub client_id: String,
    pub client_type: String,
    pub auth_types: BTreeSet<AuthType>,
    /// 令牌有效期（秒），为空时使用全局默认值
    pub timeout_secs: Option<i64>,
    pub status: EnableStatus,
}

impl Client {
    /// 校验终端可用且允许该认证方式
    pub fn ensure_allows(&self, auth_type: AuthType) -> AuthResult<()> {
        if !self.status.is_enabled() {
            return Err(AuthError::ClientDisabled);
        }
        if !self.auth_types.contains(&auth_type) {
            return Err(AuthError::AuthTypeNotAllowed(auth_type));
        }
        Ok(())
    }
}
