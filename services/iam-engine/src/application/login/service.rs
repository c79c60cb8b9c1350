//! 登录服务
//!
//! 登录链路：终端校验 → 选择处理器 → 前置校验 → 解析用户 → 状态检查 → 凭证校验 → 签发令牌。
//! 任一步骤失败立即终止，不签发令牌，也不做重试。

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use super::handler::UserLookup;
use super::registry::LoginStrategyRegistry;
use super::request::LoginRequest;
use crate::domain::{AuthType, ClientRepository, IssuedToken, SocialIdentity, TokenIssuer, TokenSubject};
use crate::error::{AuthError, AuthResult};

/// 登录结果
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Token(IssuedToken),
    /// 第三方身份未绑定，前端需引导绑定
    BindRequired(SocialIdentity),
}

pub struct AuthService {
    registry: Arc<LoginStrategyRegistry>,
    clients: Arc<dyn ClientRepository>,
    token_issuer: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        registry: Arc<LoginStrategyRegistry>,
        clients: Arc<dyn ClientRepository>,
        token_issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            registry,
            clients,
            token_issuer,
        }
    }

    #[instrument(skip_all, fields(auth_type = %request.auth_type(), client_id = %request.client_id))]
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let start = Instant::now();
        let auth_type = request.auth_type();

        let result = self.dispatch(auth_type, &request).await;

        let outcome = match &result {
            Ok(LoginOutcome::Token(_)) => "success",
            Ok(LoginOutcome::BindRequired(_)) => "bind_required",
            Err(e) => e.code(),
        };
        metrics::counter!(
            "login_attempts_total",
            "auth_type" => auth_type.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("login_duration_ms", "auth_type" => auth_type.as_str())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if let Err(e) = &result {
            warn!(code = e.code(), error = %e, "Login failed");
        }
        result
    }

    async fn dispatch(&self, auth_type: AuthType, request: &LoginRequest) -> AuthResult<LoginOutcome> {
        request.validate()?;

        let handler = self.registry.resolve(auth_type)?;

        let client = self
            .clients
            .find_by_client_id(&request.client_id)
            .await?
            .ok_or(AuthError::ClientNotFound)?;
        client.ensure_allows(auth_type)?;

        let credentials = &request.credentials;
        handler.pre_login(credentials, &client).await?;

        let user = match handler.resolve_user(credentials).await? {
            UserLookup::Found(user) => user,
            UserLookup::BindRequired(identity) => {
                info!(source = %identity.source, "Social login requires binding");
                return Ok(LoginOutcome::BindRequired(identity));
            }
        };

        handler.check_user_status(&user).await?;
        handler.verify_credentials(credentials, &user).await?;

        let token = self.token_issuer.issue(&user, &client).await?;
        info!(user_id = %user.id, "Login succeeded");
        Ok(LoginOutcome::Token(token))
    }

    /// 注销：令牌在剩余有效期内被拉黑
    #[instrument(skip_all, fields(user_id = %subject.user_id))]
    pub async fn logout(&self, subject: &TokenSubject) -> AuthResult<()> {
        self.token_issuer.revoke(subject).await?;
        info!("Logout succeeded");
        Ok(())
    }
}
