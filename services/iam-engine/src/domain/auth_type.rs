//! 认证方式

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 认证方式（封闭集合，无默认处理器）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthType {
    /// 账号密码
    Account,
    /// 邮箱验证码
    Email,
    /// 手机号验证码
    Phone,
    /// 第三方账号
    Social,
}

impl AuthType {
    pub const ALL: [AuthType; 4] = [
        AuthType::Account,
        AuthType::Email,
        AuthType::Phone,
        AuthType::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Account => "ACCOUNT",
            AuthType::Email => "EMAIL",
            AuthType::Phone => "PHONE",
            AuthType::Social => "SOCIAL",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown auth type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("email".parse::<AuthType>().unwrap(), AuthType::Email);
        assert_eq!(" SOCIAL ".parse::<AuthType>().unwrap(), AuthType::Social);
        assert!("oauth".parse::<AuthType>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_tag() {
        assert_eq!(serde_json::to_string(&AuthType::Phone).unwrap(), "\"PHONE\"");
    }
}
