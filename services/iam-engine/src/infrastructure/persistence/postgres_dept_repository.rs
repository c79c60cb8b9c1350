//! PostgreSQL 部门目录实现

use std::collections::BTreeSet;

use async_trait::async_trait;
use iam_adapter_postgres::map_sqlx_error;
use iam_common::{DeptId, EnableStatus};
use iam_errors::AppResult;
use sqlx::PgPool;

use crate::domain::{Dept, OrgUnitDirectory};

pub struct PostgresDeptRepository {
    pool: PgPool,
}

impl PostgresDeptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgUnitDirectory for PostgresDeptRepository {
    async fn find_by_id(&self, id: DeptId) -> AppResult<Option<Dept>> {
        let row = sqlx::query_as::<_, DeptRow>(
            "SELECT id, parent_id, name, status FROM sys_dept WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| Dept {
            id: DeptId(r.id),
            parent_id: DeptId(r.parent_id),
            name: r.name,
            status: EnableStatus::from_code(r.status),
        }))
    }

    async fn descendants(&self, id: DeptId) -> AppResult<BTreeSet<DeptId>> {
        // UNION 去重，层级数据有环时也能终止
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            WITH RECURSIVE sub(id) AS (
                SELECT id FROM sys_dept WHERE parent_id = $1
                UNION
                SELECT d.id FROM sys_dept d JOIN sub ON d.parent_id = sub.id
            )
            SELECT id FROM sub WHERE id <> $1
            "#,
        )
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|(id,)| DeptId(id)).collect())
    }
}

#[derive(sqlx::FromRow)]
struct DeptRow {
    id: i64,
    parent_id: i64,
    name: String,
    status: i16,
}
