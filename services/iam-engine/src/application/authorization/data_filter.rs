//! 数据权限过滤条件
//!
//! 把 `Visibility` 渲染为 SQL 谓词，供业务查询拼接使用。

use iam_common::DeptId;
use sqlx::{Postgres, QueryBuilder};

use crate::domain::Visibility;

/// 过滤所作用的列
#[derive(Debug, Clone, Copy)]
pub struct DataFilter<'a> {
    /// 部门列，例如 `t.dept_id`
    pub dept_column: &'a str,
    /// 创建人列，例如 `t.create_user`
    pub owner_column: &'a str,
}

impl<'a> DataFilter<'a> {
    pub fn new(dept_column: &'a str, owner_column: &'a str) -> Self {
        Self {
            dept_column,
            owner_column,
        }
    }

    /// 追加 `AND (...)` 谓词；不受限时不追加任何条件
    ///
    /// 调用方需保证 builder 已处于 WHERE 子句中。
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>, visibility: &Visibility) {
        match visibility {
            Visibility::Unrestricted => {}
            Visibility::Units(units) if units.is_empty() => {
                builder.push(" AND FALSE");
            }
            Visibility::Units(units) => {
                let ids: Vec<i64> = units.iter().map(DeptId::value).collect();
                builder
                    .push(" AND ")
                    .push(self.dept_column)
                    .push(" = ANY(")
                    .push_bind(ids)
                    .push(")");
            }
            Visibility::OwnedBy(user_id) => {
                builder
                    .push(" AND ")
                    .push(self.owner_column)
                    .push(" = ")
                    .push_bind(user_id.value());
            }
        }
    }
}
