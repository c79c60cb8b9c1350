//! iam-auth-core - 认证核心库
//!
//! JWT Claims 与令牌签发/校验

use chrono::{Duration, Utc};
use iam_common::UserId;
use iam_errors::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN: &str = "access";

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// 签发令牌的终端（客户端）
    pub client_id: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Token type
    #[serde(default)]
    pub token_type: String,
}

impl Claims {
    pub fn new(
        user_id: &UserId,
        client_id: &str,
        expires_in_secs: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            client_id: client_id.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            token_type: ACCESS_TOKEN.to_string(),
        }
    }

    pub fn user_id(&self) -> AppResult<UserId> {
        self.sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    /// 剩余有效期（秒），已过期返回 0
    pub fn remaining_secs(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == ACCESS_TOKEN
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_expires_in: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: &str, default_expires_in: i64, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_expires_in,
            issuer,
            audience,
        }
    }

    /// 生成访问令牌，`expires_in` 为空时使用默认有效期
    pub fn generate_access_token(
        &self,
        user_id: &UserId,
        client_id: &str,
        expires_in: Option<i64>,
    ) -> AppResult<(String, Claims)> {
        let claims = Claims::new(
            user_id,
            client_id,
            expires_in.unwrap_or(self.default_expires_in),
            &self.issuer,
            &self.audience,
        );

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

        Ok((token, claims))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        if claims.jti.is_empty() {
            return Err(AppError::unauthorized("Token ID (jti) missing"));
        }

        if !claims.is_access_token() {
            return Err(AppError::unauthorized("Not an access token"));
        }

        Ok(claims)
    }

    pub fn default_expires_in(&self) -> i64 {
        self.default_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, 3600, "iam-engine".to_string(), "admin-console".to_string())
    }

    #[test]
    fn test_issue_and_validate() {
        let svc = service("test_secret");
        let (token, issued) = svc
            .generate_access_token(&UserId(42), "web-admin", None)
            .unwrap();

        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId(42));
        assert_eq!(claims.client_id, "web-admin");
        assert_eq!(claims.jti, issued.jti);
        assert!(claims.remaining_secs() <= 3600);
    }

    #[test]
    fn test_client_timeout_overrides_default() {
        let svc = service("test_secret");
        let (_, claims) = svc
            .generate_access_token(&UserId(1), "app", Some(60))
            .unwrap();
        assert!(claims.exp - claims.iat <= 60);
    }

    #[test]
    fn test_reject_foreign_signature() {
        let (token, _) = service("secret-a")
            .generate_access_token(&UserId(1), "web", None)
            .unwrap();
        assert!(service("secret-b").validate_token(&token).is_err());
    }

    #[test]
    fn test_reject_expired() {
        let svc = service("test_secret");
        let (token, _) = svc
            .generate_access_token(&UserId(1), "web", Some(-10))
            .unwrap();
        let err = svc.validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
