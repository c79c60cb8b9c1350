//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

define_id!(
    /// 用户 ID
    UserId
);

define_id!(
    /// 角色 ID
    RoleId
);

define_id!(
    /// 部门（组织单元）ID
    DeptId
);

define_id!(
    /// 菜单 ID
    MenuId
);

/// 启用/禁用状态
///
/// 持久化编码：1 启用，2 禁用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnableStatus {
    #[default]
    Enabled,
    Disabled,
}

impl EnableStatus {
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => Self::Enabled,
            _ => Self::Disabled,
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id, UserId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<RoleId>().is_err());
    }

    #[test]
    fn test_id_serde_transparent() {
        assert_eq!(serde_json::to_string(&DeptId(7)).unwrap(), "7");
        let id: MenuId = serde_json::from_str("1001").unwrap();
        assert_eq!(id.value(), 1001);
    }

    #[test]
    fn test_enable_status_codes() {
        assert!(EnableStatus::from_code(1).is_enabled());
        assert!(!EnableStatus::from_code(2).is_enabled());
        assert!(!EnableStatus::from_code(0).is_enabled());
        assert_eq!(EnableStatus::Disabled.code(), 2);
    }
}
