//! 部门（组织单元）

use iam_common::{DeptId, EnableStatus};

/// 部门
#[derive(Debug, Clone)]
pub struct Dept {
    pub id: DeptId,
    pub parent_id: DeptId,
    pub name: String,
    pub status: EnableStatus,
}
