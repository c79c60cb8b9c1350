//! 登录策略注册表
//!
//! 启动时显式注册，构建后只读；运行期查找无锁。

use std::collections::HashMap;
use std::sync::Arc;

use iam_errors::{AppError, AppResult};
use tracing::info;

use super::handler::LoginHandler;
use crate::domain::AuthType;
use crate::error::{AuthError, AuthResult};

/// 登录策略注册表
pub struct LoginStrategyRegistry {
    handlers: HashMap<AuthType, Arc<dyn LoginHandler>>,
}

impl LoginStrategyRegistry {
    pub fn builder() -> LoginStrategyRegistryBuilder {
        LoginStrategyRegistryBuilder::default()
    }

    /// 查找认证方式对应的处理器
    pub fn resolve(&self, auth_type: AuthType) -> AuthResult<Arc<dyn LoginHandler>> {
        self.handlers
            .get(&auth_type)
            .cloned()
            .ok_or(AuthError::UnsupportedAuthType(auth_type))
    }

    /// 已注册的认证方式（有序）
    pub fn registered(&self) -> Vec<AuthType> {
        let mut types: Vec<AuthType> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    /// 启动期校验：每种认证方式都必须有处理器
    pub fn ensure_complete(&self) -> AppResult<()> {
        let missing: Vec<&str> = AuthType::ALL
            .iter()
            .filter(|t| !self.handlers.contains_key(*t))
            .map(|t| t.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::internal(format!(
                "No login handler registered for: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct LoginStrategyRegistryBuilder {
    handlers: Vec<(AuthType, Arc<dyn LoginHandler>)>,
}

impl LoginStrategyRegistryBuilder {
    pub fn register(mut self, auth_type: AuthType, handler: Arc<dyn LoginHandler>) -> Self {
        self.handlers.push((auth_type, handler));
        self
    }

    /// 构建注册表；标签与处理器不一致或重复注册均视为配置错误
    pub fn build(self) -> AppResult<LoginStrategyRegistry> {
        let mut handlers: HashMap<AuthType, Arc<dyn LoginHandler>> = HashMap::new();
        for (auth_type, handler) in self.handlers {
            if handler.auth_type() != auth_type {
                return Err(AppError::internal(format!(
                    "Login handler for {} registered under {}",
                    handler.auth_type(),
                    auth_type
                )));
            }
            if handlers.insert(auth_type, handler).is_some() {
                return Err(AppError::internal(format!(
                    "Duplicate login handler for {}",
                    auth_type
                )));
            }
        }

        info!(count = handlers.len(), "Login strategy registry built");
        Ok(LoginStrategyRegistry { handlers })
    }
}
