//! 权限码与菜单聚合

use std::collections::BTreeSet;
use std::sync::Arc;

use iam_common::{DeptId, MenuId, RoleId, UserId};
use iam_errors::AppResult;
use tracing::{error, info, instrument};

use super::data_scope::SuperAdmin;
use crate::domain::{
    AssociationChange, AssociationKind, Menu, MenuRepository, MenuType, ReplaceOutcome, Role,
    RoleAssociationStore, RouteNode, build_route_tree,
};
use crate::error::{AuthError, AuthResult};

/// 全部权限通配符
pub const ALL_PERMISSION: &str = "*:*:*";

/// 判断权限码集合是否包含指定权限（含通配符）
pub fn has_permission(codes: &BTreeSet<String>, code: &str) -> bool {
    codes.contains(ALL_PERMISSION) || codes.contains(code)
}

/// 权限聚合器
pub struct PermissionAggregator {
    menus: Arc<dyn MenuRepository>,
    associations: Arc<dyn RoleAssociationStore>,
    super_admin: SuperAdmin,
}

impl PermissionAggregator {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        associations: Arc<dyn RoleAssociationStore>,
        super_admin: SuperAdmin,
    ) -> Self {
        Self {
            menus,
            associations,
            super_admin,
        }
    }

    /// 计算权限码：启用菜单上非空权限码的并集；超级管理员只有通配符
    pub async fn compute_permission_codes(
        &self,
        user_id: UserId,
        roles: &[Role],
    ) -> AppResult<BTreeSet<String>> {
        if self.super_admin.is(user_id) {
            return Ok(BTreeSet::from([ALL_PERMISSION.to_string()]));
        }

        let menus = self.role_menus(roles).await?;
        Ok(menus
            .iter()
            .filter(|m| m.is_enabled())
            .filter_map(|m| m.permission_code())
            .map(str::to_string)
            .collect())
    }

    /// 计算菜单树：启用的目录/菜单去重后按父 ID 组装，按钮不进入路由树
    pub async fn compute_menu_tree(&self, user_id: UserId, roles: &[Role]) -> AppResult<Vec<RouteNode>> {
        let menus = if self.super_admin.is(user_id) {
            self.menus.list_all().await?
        } else {
            self.role_menus(roles).await?
        };

        Ok(build_route_tree(
            menus
                .iter()
                .filter(|m| m.is_enabled() && m.menu_type != MenuType::Button),
        ))
    }

    async fn role_menus(&self, roles: &[Role]) -> AppResult<Vec<Menu>> {
        let menu_ids: BTreeSet<MenuId> = roles
            .iter()
            .flat_map(|r| r.menu_ids.iter().copied())
            .collect();
        if menu_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.menus.find_by_ids(&menu_ids).await
    }

    /// 整体替换角色的菜单关联
    #[instrument(skip(self, menu_ids), fields(requested = menu_ids.len()))]
    pub async fn replace_role_menus(
        &self,
        role_id: RoleId,
        menu_ids: BTreeSet<MenuId>,
    ) -> AuthResult<ReplaceOutcome> {
        let kind = AssociationKind::Menu;
        let current = self
            .associations
            .menu_ids(role_id)
            .await
            .map_err(|e| replace_failed(role_id, kind, e))?;

        let result = match AssociationChange::diff(&current, &menu_ids) {
            AssociationChange::Unchanged => Ok(ReplaceOutcome::Unchanged),
            AssociationChange::Replace {
                target,
                added,
                removed,
            } => self
                .associations
                .replace_menu_ids(role_id, &target)
                .await
                .map(|_| ReplaceOutcome::Replaced { added, removed })
                .map_err(|e| replace_failed(role_id, kind, e)),
        };
        record_replace(role_id, kind, &result);
        result
    }

    /// 整体替换角色的自定义数据权限部门
    #[instrument(skip(self, dept_ids), fields(requested = dept_ids.len()))]
    pub async fn replace_role_depts(
        &self,
        role_id: RoleId,
        dept_ids: BTreeSet<DeptId>,
    ) -> AuthResult<ReplaceOutcome> {
        let kind = AssociationKind::Dept;
        let current = self
            .associations
            .dept_ids(role_id)
            .await
            .map_err(|e| replace_failed(role_id, kind, e))?;

        let result = match AssociationChange::diff(&current, &dept_ids) {
            AssociationChange::Unchanged => Ok(ReplaceOutcome::Unchanged),
            AssociationChange::Replace {
                target,
                added,
                removed,
            } => self
                .associations
                .replace_dept_ids(role_id, &target)
                .await
                .map(|_| ReplaceOutcome::Replaced { added, removed })
                .map_err(|e| replace_failed(role_id, kind, e)),
        };
        record_replace(role_id, kind, &result);
        result
    }
}

fn replace_failed(role_id: RoleId, kind: AssociationKind, e: iam_errors::AppError) -> AuthError {
    AuthError::AssociationReplaceFailed {
        role_id,
        kind,
        reason: e.to_string(),
    }
}

fn record_replace(role_id: RoleId, kind: AssociationKind, result: &AuthResult<ReplaceOutcome>) {
    let outcome = match result {
        Ok(ReplaceOutcome::Unchanged) => "unchanged",
        Ok(ReplaceOutcome::Replaced { .. }) => "replaced",
        Err(_) => "failed",
    };
    metrics::counter!(
        "role_association_updates_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    match result {
        Ok(ReplaceOutcome::Replaced { added, removed }) => {
            info!(role_id = %role_id, kind = %kind, added, removed, "Role associations replaced");
        }
        Ok(ReplaceOutcome::Unchanged) => {
            info!(role_id = %role_id, kind = %kind, "Role associations unchanged, no write");
        }
        Err(e) => {
            error!(role_id = %role_id, kind = %kind, error = %e, "Role association replace failed");
        }
    }
}
