//! PostgreSQL 角色关联存储
//!
//! 整体替换在单个事务内先删后插，失败时回滚保留旧集合。

use std::collections::BTreeSet;

use async_trait::async_trait;
use iam_adapter_postgres::{TransactionManager, map_sqlx_error};
use iam_common::{DeptId, MenuId, RoleId};
use iam_errors::AppResult;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::domain::RoleAssociationStore;

/// 关联表定义
struct AssociationTable {
    table: &'static str,
    column: &'static str,
}

const ROLE_MENU: AssociationTable = AssociationTable {
    table: "sys_role_menu",
    column: "menu_id",
};

const ROLE_DEPT: AssociationTable = AssociationTable {
    table: "sys_role_dept",
    column: "dept_id",
};

pub struct PostgresAssociationStore {
    tx_manager: TransactionManager,
}

impl PostgresAssociationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool),
        }
    }

    async fn load(&self, assoc: &AssociationTable, role_id: RoleId) -> AppResult<Vec<i64>> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE role_id = $1 ORDER BY {col}",
            col = assoc.column,
            table = assoc.table
        );
        let rows: Vec<(i64,)> = sqlx::query_as(&sql)
            .bind(role_id.value())
            .fetch_all(self.tx_manager.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn replace(&self, assoc: &AssociationTable, role_id: RoleId, ids: Vec<i64>) -> AppResult<()> {
        let mut tx = self.tx_manager.begin().await?;

        let delete = format!("DELETE FROM {} WHERE role_id = $1", assoc.table);
        if let Err(e) = sqlx::query(&delete)
            .bind(role_id.value())
            .execute(&mut *tx)
            .await
        {
            warn!(role_id = %role_id, table = assoc.table, "Delete failed, rolling back");
            return Err(TransactionManager::abort(tx, map_sqlx_error(e)).await);
        }

        if !ids.is_empty() {
            let insert = format!(
                "INSERT INTO {} (role_id, {}) SELECT $1, UNNEST($2::bigint[])",
                assoc.table, assoc.column
            );
            if let Err(e) = sqlx::query(&insert)
                .bind(role_id.value())
                .bind(&ids)
                .execute(&mut *tx)
                .await
            {
                warn!(role_id = %role_id, table = assoc.table, "Insert failed, rolling back");
                return Err(TransactionManager::abort(tx, map_sqlx_error(e)).await);
            }
        }

        TransactionManager::commit(tx).await?;
        debug!(role_id = %role_id, table = assoc.table, count = ids.len(), "Associations replaced");
        Ok(())
    }
}

#[async_trait]
impl RoleAssociationStore for PostgresAssociationStore {
    async fn menu_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<MenuId>> {
        Ok(self
            .load(&ROLE_MENU, role_id)
            .await?
            .into_iter()
            .map(MenuId)
            .collect())
    }

    async fn dept_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<DeptId>> {
        Ok(self
            .load(&ROLE_DEPT, role_id)
            .await?
            .into_iter()
            .map(DeptId)
            .collect())
    }

    async fn replace_menu_ids(&self, role_id: RoleId, menu_ids: &BTreeSet<MenuId>) -> AppResult<()> {
        let ids = menu_ids.iter().map(MenuId::value).collect();
        self.replace(&ROLE_MENU, role_id, ids).await
    }

    async fn replace_dept_ids(&self, role_id: RoleId, dept_ids: &BTreeSet<DeptId>) -> AppResult<()> {
        let ids = dept_ids.iter().map(DeptId::value).collect();
        self.replace(&ROLE_DEPT, role_id, ids).await
    }
}
