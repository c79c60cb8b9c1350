//! 数据权限聚合规则
//!
//! 多角色取最宽松范围：ALL > DEPT_AND_CHILD > DEPT = CUSTOM > SELF。
//! 本模块只做纯计算，部门树展开由 `DataScopeResolver` 借助 `OrgUnitDirectory` 完成。

use std::collections::BTreeSet;

use iam_common::{DeptId, UserId};
use serde::Serialize;

use super::role::{DataScope, Role};

/// 行级可见性
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// 不受限（哨兵值，不枚举部门）
    Unrestricted,
    /// 仅可见这些部门的数据
    Units(BTreeSet<DeptId>),
    /// 仅可见本人创建的数据
    OwnedBy(UserId),
}

impl Visibility {
    /// 判断一行数据是否可见
    pub fn permits(&self, dept_id: Option<DeptId>, owner_id: Option<UserId>) -> bool {
        match self {
            Visibility::Unrestricted => true,
            Visibility::Units(units) => dept_id.is_some_and(|d| units.contains(&d)),
            Visibility::OwnedBy(user_id) => owner_id == Some(*user_id),
        }
    }
}

/// 生效的数据权限
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDataScope {
    pub scope: DataScope,
    pub visibility: Visibility,
}

impl EffectiveDataScope {
    pub fn unrestricted() -> Self {
        Self {
            scope: DataScope::All,
            visibility: Visibility::Unrestricted,
        }
    }
}

/// 角色聚合后的中间结果，尚未展开部门树
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePlan {
    All,
    /// 本部门及所有下级
    DeptAndChild,
    /// 本部门（`include_own_dept`）与自定义部门的并集
    Units {
        scope: DataScope,
        include_own_dept: bool,
        custom: BTreeSet<DeptId>,
    },
    SelfOnly,
}

impl ScopePlan {
    /// 聚合角色的数据权限，结果与角色顺序无关
    pub fn aggregate(roles: &[Role]) -> Self {
        let Some(widest) = roles.iter().map(|r| r.data_scope).max_by_key(DataScope::rank) else {
            return ScopePlan::SelfOnly;
        };

        // DEPT 与 CUSTOM 同级，落入同一分支，因此与取到哪一个无关
        match widest {
            DataScope::All => ScopePlan::All,
            DataScope::DeptAndChild => ScopePlan::DeptAndChild,
            DataScope::Dept | DataScope::Custom => {
                let include_own_dept = roles.iter().any(|r| r.data_scope == DataScope::Dept);
                let custom_roles: Vec<&Role> = roles
                    .iter()
                    .filter(|r| r.data_scope == DataScope::Custom)
                    .collect();
                let custom: BTreeSet<DeptId> = custom_roles
                    .iter()
                    .flat_map(|r| r.dept_ids.iter().copied())
                    .collect();
                let scope = if custom_roles.is_empty() {
                    DataScope::Dept
                } else {
                    DataScope::Custom
                };
                ScopePlan::Units {
                    scope,
                    include_own_dept,
                    custom,
                }
            }
            DataScope::SelfOnly => ScopePlan::SelfOnly,
        }
    }

    pub fn scope(&self) -> DataScope {
        match self {
            ScopePlan::All => DataScope::All,
            ScopePlan::DeptAndChild => DataScope::DeptAndChild,
            ScopePlan::Units { scope, .. } => *scope,
            ScopePlan::SelfOnly => DataScope::SelfOnly,
        }
    }
}
