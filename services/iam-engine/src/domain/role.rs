//! 角色与数据权限范围

use std::collections::BTreeSet;

use iam_common::{DeptId, MenuId, RoleId};
use serde::{Deserialize, Serialize};

/// 数据权限范围
///
/// 持久化编码：ALL=1, DEPT_AND_CHILD=2, DEPT=3, SELF=4, CUSTOM=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataScope {
    /// 全部数据
    All,
    /// 本部门及以下
    DeptAndChild,
    /// 本部门
    Dept,
    /// 仅本人
    #[serde(rename = "SELF")]
    SelfOnly,
    /// 自定义部门集合
    Custom,
}

impl DataScope {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::All),
            2 => Some(Self::DeptAndChild),
            3 => Some(Self::Dept),
            4 => Some(Self::SelfOnly),
            5 => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::All => 1,
            Self::DeptAndChild => 2,
            Self::Dept => 3,
            Self::SelfOnly => 4,
            Self::Custom => 5,
        }
    }

    /// 宽松程度，数值越大可见范围越大；CUSTOM 与 DEPT 同级
    pub fn rank(&self) -> u8 {
        match self {
            Self::All => 4,
            Self::DeptAndChild => 3,
            Self::Dept | Self::Custom => 2,
            Self::SelfOnly => 1,
        }
    }
}

/// 角色
#[derive(Debug, Clone)]
pub struct Role {
    pub id: RoleId,
    pub code: String,
    pub name: String,
    pub data_scope: DataScope,
    /// 自定义数据权限部门，仅 `DataScope::Custom` 时有意义
    pub dept_ids: BTreeSet<DeptId>,
    pub menu_ids: BTreeSet<MenuId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping_is_stable() {
        for scope in [
            DataScope::All,
            DataScope::DeptAndChild,
            DataScope::Dept,
            DataScope::SelfOnly,
            DataScope::Custom,
        ] {
            assert_eq!(DataScope::from_code(scope.code()), Some(scope));
        }
        assert_eq!(DataScope::from_code(9), None);
    }

    #[test]
    fn test_rank_order() {
        assert!(DataScope::All.rank() > DataScope::DeptAndChild.rank());
        assert!(DataScope::DeptAndChild.rank() > DataScope::Dept.rank());
        assert_eq!(DataScope::Dept.rank(), DataScope::Custom.rank());
        assert!(DataScope::Custom.rank() > DataScope::SelfOnly.rank());
    }

    #[test]
    fn test_self_serializes_as_self() {
        assert_eq!(serde_json::to_string(&DataScope::SelfOnly).unwrap(), "\"SELF\"");
        assert_eq!(
            serde_json::to_string(&DataScope::DeptAndChild).unwrap(),
            "\"DEPT_AND_CHILD\""
        );
    }
}
