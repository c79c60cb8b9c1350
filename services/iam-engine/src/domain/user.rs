//! 用户（只读视图）

use chrono::{DateTime, Duration, Utc};
use iam_common::{DeptId, EnableStatus, UserId};
use serde::{Deserialize, Serialize};

/// 用户
///
/// 引擎只读取用户，不修改；密码哈希由 `CredentialVerifier` 解释。
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: EnableStatus,
    pub dept_id: Option<DeptId>,
    /// 最近一次修改/重置密码的时间
    pub pwd_reset_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    /// 密码是否已过期
    ///
    /// `expiry_days` 为 0 表示不启用过期策略；从未重置过密码的用户以创建时间为起点。
    pub fn is_password_expired(&self, expiry_days: u32, now: DateTime<Utc>) -> bool {
        if expiry_days == 0 || self.password_hash.is_none() {
            return false;
        }
        let since = self.pwd_reset_time.unwrap_or(self.created_at);
        since + Duration::days(i64::from(expiry_days)) <= now
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("status", &self.status)
            .field("dept_id", &self.dept_id)
            .finish_non_exhaustive()
    }
}

/// 第三方身份（社交登录回调后得到）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialIdentity {
    pub source: String,
    pub open_id: String,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}
