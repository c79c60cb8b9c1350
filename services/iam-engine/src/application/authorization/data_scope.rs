//! 数据权限解析

use std::collections::BTreeSet;
use std::sync::Arc;

use iam_common::{DeptId, UserId};
use iam_errors::AppResult;
use tracing::debug;

use crate::domain::{
    DataScope, EffectiveDataScope, OrgUnitDirectory, Role, ScopePlan, User, Visibility,
};

/// 超级管理员身份
///
/// 显式的身份判断，不依赖角色数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperAdmin(pub UserId);

impl SuperAdmin {
    pub fn is(&self, user_id: UserId) -> bool {
        self.0 == user_id
    }
}

/// 数据权限解析器
pub struct DataScopeResolver {
    org_units: Arc<dyn OrgUnitDirectory>,
    super_admin: SuperAdmin,
}

impl DataScopeResolver {
    pub fn new(org_units: Arc<dyn OrgUnitDirectory>, super_admin: SuperAdmin) -> Self {
        Self {
            org_units,
            super_admin,
        }
    }

    /// 将用户的角色集合解析为行级可见性
    pub async fn resolve(&self, user: &User, roles: &[Role]) -> AppResult<EffectiveDataScope> {
        if self.super_admin.is(user.id) {
            return Ok(EffectiveDataScope::unrestricted());
        }

        let plan = ScopePlan::aggregate(roles);
        let scope = plan.scope();
        let visibility = match plan {
            ScopePlan::All => Visibility::Unrestricted,
            ScopePlan::SelfOnly => Visibility::OwnedBy(user.id),
            ScopePlan::DeptAndChild => {
                let mut units = BTreeSet::new();
                if let Some(dept_id) = user.dept_id {
                    units.insert(dept_id);
                    units.extend(self.org_units.descendants(dept_id).await?);
                }
                Visibility::Units(units)
            }
            ScopePlan::Units {
                include_own_dept,
                custom,
                ..
            } => {
                let mut units: BTreeSet<DeptId> = custom;
                if include_own_dept {
                    units.extend(user.dept_id);
                }
                Visibility::Units(units)
            }
        };

        debug!(
            user_id = %user.id,
            roles = roles.len(),
            scope = ?scope,
            "Data scope resolved"
        );
        Ok(EffectiveDataScope { scope, visibility })
    }

    pub fn super_admin(&self) -> SuperAdmin {
        self.super_admin
    }
}
