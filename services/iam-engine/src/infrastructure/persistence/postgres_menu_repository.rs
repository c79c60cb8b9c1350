//! PostgreSQL 菜单 Repository 实现

use std::collections::BTreeSet;

use async_trait::async_trait;
use iam_adapter_postgres::map_sqlx_error;
use iam_common::{EnableStatus, MenuId};
use iam_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::{Menu, MenuRepository, MenuType};

const SELECT_MENU: &str = r#"
    SELECT id, parent_id, title, type, path, name, component, redirect, icon,
           is_external, is_cache, is_hidden, permission, sort, status
    FROM sys_menu
"#;

pub struct PostgresMenuRepository {
    pool: PgPool,
}

impl PostgresMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PostgresMenuRepository {
    async fn find_by_ids(&self, ids: &BTreeSet<MenuId>) -> AppResult<Vec<Menu>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(MenuId::value).collect();
        let sql = format!("{} WHERE id = ANY($1) ORDER BY sort, id", SELECT_MENU);

        let rows = sqlx::query_as::<_, MenuRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(MenuRow::into_menu).collect()
    }

    async fn list_all(&self) -> AppResult<Vec<Menu>> {
        let sql = format!("{} ORDER BY sort, id", SELECT_MENU);
        let rows = sqlx::query_as::<_, MenuRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(MenuRow::into_menu).collect()
    }
}

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: i64,
    parent_id: i64,
    title: String,
    #[sqlx(rename = "type")]
    menu_type: i16,
    path: Option<String>,
    name: Option<String>,
    component: Option<String>,
    redirect: Option<String>,
    icon: Option<String>,
    is_external: bool,
    is_cache: bool,
    is_hidden: bool,
    permission: Option<String>,
    sort: i32,
    status: i16,
}

impl MenuRow {
    fn into_menu(self) -> AppResult<Menu> {
        let menu_type = MenuType::from_code(self.menu_type).ok_or_else(|| {
            AppError::database(format!(
                "Invalid menu type {} for menu {}",
                self.menu_type, self.id
            ))
        })?;

        Ok(Menu {
            id: MenuId(self.id),
            parent_id: MenuId(self.parent_id),
            title: self.title,
            menu_type,
            path: self.path,
            name: self.name,
            component: self.component,
            redirect: self.redirect,
            icon: self.icon,
            is_external: self.is_external,
            is_cache: self.is_cache,
            is_hidden: self.is_hidden,
            permission: self.permission,
            sort: self.sort,
            status: EnableStatus::from_code(self.status),
        })
    }
}
