//! 一次性验证码存储
//!
//! 验证码按用途加前缀存放在缓存中，校验成功后以比较并删除的方式消费，
//! 同一验证码的并发提交最多只有一个成功。

use std::sync::Arc;
use std::time::Duration;

use iam_errors::AppResult;
use iam_ports::CachePort;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};

/// 邮箱/短信登录验证码 key 前缀
pub const LOGIN_CODE_PREFIX: &str = "login-code:";

/// 图形验证码 key 前缀
pub const CAPTCHA_PREFIX: &str = "captcha:";

const CODE_LENGTH: usize = 6;

/// 验证码用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChannel {
    /// 邮箱或手机号登录验证码，标识为邮箱/手机号
    LoginCode,
    /// 账号登录的图形验证码，标识为验证码 uuid
    Captcha,
}

impl CodeChannel {
    fn prefix(&self) -> &'static str {
        match self {
            CodeChannel::LoginCode => LOGIN_CODE_PREFIX,
            CodeChannel::Captcha => CAPTCHA_PREFIX,
        }
    }
}

/// 一次性验证码存储
pub struct LoginCodeStore {
    cache: Arc<dyn CachePort>,
    login_code_ttl: Duration,
    captcha_ttl: Duration,
}

impl LoginCodeStore {
    pub fn new(cache: Arc<dyn CachePort>, login_code_ttl: Duration, captcha_ttl: Duration) -> Self {
        Self {
            cache,
            login_code_ttl,
            captcha_ttl,
        }
    }

    pub fn key(channel: CodeChannel, identifier: &str) -> String {
        format!("{}{}", channel.prefix(), identifier)
    }

    /// 生成并保存验证码，返回验证码明文（由调用方负责投递）
    pub async fn issue(&self, channel: CodeChannel, identifier: &str) -> AppResult<String> {
        let code = generate_numeric_code(CODE_LENGTH);
        let ttl = match channel {
            CodeChannel::LoginCode => self.login_code_ttl,
            CodeChannel::Captcha => self.captcha_ttl,
        };
        self.cache
            .set(&Self::key(channel, identifier), &code, Some(ttl))
            .await?;
        debug!(channel = ?channel, ttl_secs = ttl.as_secs(), "One-time code issued");
        Ok(code)
    }

    /// 校验并消费验证码
    ///
    /// - 不存在（过期或已被使用）：`CaptchaExpired`
    /// - 不匹配（忽略大小写）：`CaptchaMismatch`，验证码保留
    /// - 匹配：原子删除；删除失败说明已被并发请求消费，按 `CaptchaExpired` 处理
    pub async fn consume(
        &self,
        channel: CodeChannel,
        identifier: &str,
        submitted: &str,
    ) -> AuthResult<()> {
        let key = Self::key(channel, identifier);

        let Some(stored) = self.cache.get(&key).await? else {
            return Err(AuthError::CaptchaExpired);
        };

        if !stored.eq_ignore_ascii_case(submitted.trim()) {
            return Err(AuthError::CaptchaMismatch);
        }

        if !self.cache.delete_if_equals(&key, &stored).await? {
            warn!(channel = ?channel, "One-time code consumed concurrently");
            return Err(AuthError::CaptchaExpired);
        }

        Ok(())
    }
}

fn generate_numeric_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
