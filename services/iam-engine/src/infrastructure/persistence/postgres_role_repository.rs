//! PostgreSQL 角色目录实现

use async_trait::async_trait;
use iam_adapter_postgres::map_sqlx_error;
use iam_common::{DeptId, MenuId, RoleId, UserId};
use iam_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::{DataScope, Role, RoleDirectory};

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleDirectory for PostgresRoleRepository {
    async fn roles_of_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.code, r.name, r.data_scope,
                   ARRAY(SELECT rd.dept_id FROM sys_role_dept rd WHERE rd.role_id = r.id) AS dept_ids,
                   ARRAY(SELECT rm.menu_id FROM sys_role_menu rm WHERE rm.role_id = r.id) AS menu_ids
            FROM sys_role r
            JOIN sys_user_role ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    code: String,
    name: String,
    data_scope: i16,
    dept_ids: Vec<i64>,
    menu_ids: Vec<i64>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let data_scope = DataScope::from_code(self.data_scope).ok_or_else(|| {
            AppError::database(format!(
                "Invalid data scope {} for role {}",
                self.data_scope, self.id
            ))
        })?;

        Ok(Role {
            id: RoleId(self.id),
            code: self.code,
            name: self.name,
            data_scope,
            dept_ids: self.dept_ids.into_iter().map(DeptId).collect(),
            menu_ids: self.menu_ids.into_iter().map(MenuId).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_data_scope_is_rejected() {
        let row = RoleRow {
            id: 7,
            code: "auditor".to_string(),
            name: "Auditor".to_string(),
            data_scope: 9,
            dept_ids: vec![],
            menu_ids: vec![],
        };
        assert!(matches!(row.into_role(), Err(AppError::Database(_))));
    }

    #[test]
    fn test_row_maps_associations() {
        let row = RoleRow {
            id: 3,
            code: "ops".to_string(),
            name: "Ops".to_string(),
            data_scope: 5,
            dept_ids: vec![10, 11, 10],
            menu_ids: vec![1],
        };
        let role = row.into_role().unwrap();
        assert_eq!(role.data_scope, DataScope::Custom);
        assert_eq!(role.dept_ids.len(), 2);
        assert!(role.menu_ids.contains(&MenuId(1)));
    }
}
