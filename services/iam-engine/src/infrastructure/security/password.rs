//! Argon2 密码校验

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use iam_errors::{AppError, AppResult};
use tracing::warn;

use crate::domain::CredentialVerifier;

/// Argon2 凭证校验
///
/// 哈希计算较重，放到阻塞线程池执行。
#[derive(Debug, Clone, Default)]
pub struct Argon2CredentialVerifier;

impl Argon2CredentialVerifier {
    pub fn new() -> Self {
        Self
    }
}

fn verify_blocking(secret: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            // 哈希格式损坏按校验失败处理
            warn!(error = %e, "Stored password hash is not a valid PHC string");
            return false;
        }
    };

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[async_trait]
impl CredentialVerifier for Argon2CredentialVerifier {
    async fn verify(&self, secret: &str, stored_hash: &str) -> AppResult<bool> {
        let secret = secret.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || verify_blocking(&secret, &stored_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))
    }
}
