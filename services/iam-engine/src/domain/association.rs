//! 角色关联（角色-菜单、角色-部门）的整体替换规则

use std::collections::BTreeSet;
use std::fmt;

/// 关联类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    Menu,
    Dept,
}

impl AssociationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::Menu => "menu",
            AssociationKind::Dept => "dept",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 差异计算结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationChange<T> {
    /// 对称差为空，无需写入
    Unchanged,
    /// 需要整体替换为新集合
    Replace {
        target: BTreeSet<T>,
        added: usize,
        removed: usize,
    },
}

impl<T: Ord + Clone> AssociationChange<T> {
    /// 比较当前集合与目标集合
    pub fn diff(current: &BTreeSet<T>, requested: &BTreeSet<T>) -> Self {
        let added = requested.difference(current).count();
        let removed = current.difference(requested).count();
        if added == 0 && removed == 0 {
            return AssociationChange::Unchanged;
        }
        AssociationChange::Replace {
            target: requested.clone(),
            added,
            removed,
        }
    }
}

/// 替换操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// 未发生写入
    Unchanged,
    Replaced { added: usize, removed: usize },
}

impl ReplaceOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> BTreeSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_same_set_is_unchanged() {
        assert_eq!(
            AssociationChange::diff(&set(&[1, 2, 3]), &set(&[3, 2, 1])),
            AssociationChange::Unchanged
        );
        assert_eq!(AssociationChange::<i64>::diff(&set(&[]), &set(&[])), AssociationChange::Unchanged);
    }

    #[test]
    fn test_different_set_replaces() {
        let change = AssociationChange::diff(&set(&[1, 2]), &set(&[2, 3, 4]));
        assert_eq!(
            change,
            AssociationChange::Replace {
                target: set(&[2, 3, 4]),
                added: 2,
                removed: 1,
            }
        );
    }

    #[test]
    fn test_clearing_is_a_change() {
        let change = AssociationChange::diff(&set(&[1]), &set(&[]));
        assert!(matches!(change, AssociationChange::Replace { removed: 1, .. }));
    }
}
