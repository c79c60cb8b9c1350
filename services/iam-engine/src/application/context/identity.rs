//! 身份解析：令牌主体 → 用户、角色、数据权限、权限码

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::application::authorization::{DataScopeResolver, PermissionAggregator, has_permission};
use crate::domain::{EffectiveDataScope, Role, RoleDirectory, User, UserRepository};
use crate::error::{AuthError, AuthResult};
use iam_common::UserId;

/// 一次请求内解析出的完整身份
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub user: User,
    pub roles: Vec<Role>,
    pub role_codes: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
    pub data_scope: EffectiveDataScope,
    pub super_admin: bool,
    pub password_expired: bool,
}

impl ResolvedIdentity {
    pub fn has_permission(&self, code: &str) -> bool {
        has_permission(&self.permissions, code)
    }

    pub fn require_permission(&self, code: &str) -> AuthResult<()> {
        if !self.has_permission(code) {
            return Err(AuthError::PermissionDenied(code.to_string()));
        }
        Ok(())
    }
}

/// 身份解析器
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleDirectory>,
    data_scope: Arc<DataScopeResolver>,
    permissions: Arc<PermissionAggregator>,
    password_expiry_days: u32,
}

impl IdentityResolver {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleDirectory>,
        data_scope: Arc<DataScopeResolver>,
        permissions: Arc<PermissionAggregator>,
        password_expiry_days: u32,
    ) -> Self {
        Self {
            users,
            roles,
            data_scope,
            permissions,
            password_expiry_days,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, user_id: UserId) -> AuthResult<ResolvedIdentity> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_enabled() {
            return Err(AuthError::UserDisabled);
        }

        let roles = self.roles.roles_of_user(user_id).await?;
        let data_scope = self.data_scope.resolve(&user, &roles).await?;
        let permissions = self
            .permissions
            .compute_permission_codes(user_id, &roles)
            .await?;

        let super_admin = self.data_scope.super_admin().is(user_id);
        let password_expired = user.is_password_expired(self.password_expiry_days, Utc::now());
        let role_codes = roles.iter().map(|r| r.code.clone()).collect();

        debug!(
            roles = roles.len(),
            permissions = permissions.len(),
            "Identity resolved"
        );

        Ok(ResolvedIdentity {
            user,
            roles,
            role_codes,
            permissions,
            data_scope,
            super_admin,
            password_expired,
        })
    }
}
