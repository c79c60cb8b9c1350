//! iam-config - 配置加载库
//!
//! 加载顺序（后者覆盖前者）：
//! 1. `{config_dir}/default.toml`
//! 2. `{config_dir}/{APP_ENV}.toml`
//! 3. `IAM_` 前缀环境变量，层级以 `__` 分隔（如 `IAM_JWT__SECRET`）

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Secret<String>,
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    /// 客户端未指定超时时使用的默认有效期（秒）
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_expires_in() -> i64 {
    86400
}

fn default_issuer() -> String {
    "iam-engine".to_string()
}

fn default_audience() -> String {
    "admin-console".to_string()
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 认证与授权配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// 超级管理员用户 ID，绕过数据权限与权限码计算
    #[serde(default = "default_super_admin_user_id")]
    pub super_admin_user_id: i64,
    /// 邮箱/短信登录验证码有效期（秒）
    #[serde(default = "default_login_code_ttl_secs")]
    pub login_code_ttl_secs: u64,
    /// 账号登录是否校验图形验证码
    #[serde(default)]
    pub captcha_enabled: bool,
    /// 图形验证码有效期（秒）
    #[serde(default = "default_captcha_ttl_secs")]
    pub captcha_ttl_secs: u64,
    /// 密码有效期（天），0 表示不过期
    #[serde(default)]
    pub password_expiry_days: u32,
}

fn default_super_admin_user_id() -> i64 {
    1
}

fn default_login_code_ttl_secs() -> u64 {
    300
}

fn default_captcha_ttl_secs() -> u64 {
    120
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            super_admin_user_id: default_super_admin_user_id(),
            login_code_ttl_secs: default_login_code_ttl_secs(),
            captcha_enabled: false,
            captcha_ttl_secs: default_captcha_ttl_secs(),
            password_expiry_days: 0,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        Self::from_figment(Self::figment(config_dir, &env))
    }

    /// 构建配置源（便于测试注入）
    pub fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("IAM_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.login_code_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.login_code_ttl_secs must be positive".to_string(),
            ));
        }
        if self.jwt.expires_in <= 0 {
            return Err(ConfigError::Invalid(
                "jwt.expires_in must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
