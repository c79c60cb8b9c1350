//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use iam_adapter_postgres::map_sqlx_error;
use iam_common::{DeptId, EnableStatus, UserId};
use iam_errors::AppResult;
use sqlx::PgPool;

use crate::domain::{SocialBindingRepository, User, UserRepository};

const SELECT_USER: &str = r#"
    SELECT id, username, nickname, password, email, phone, avatar,
           status, dept_id, pwd_reset_time, create_time
    FROM sys_user
"#;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("{} WHERE {} = $1", SELECT_USER, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_user))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let sql = format!("{} WHERE id = $1", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        self.find_one("phone", phone).await
    }
}

#[async_trait]
impl SocialBindingRepository for PostgresUserRepository {
    async fn find_user_id(&self, source: &str, open_id: &str) -> AppResult<Option<UserId>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM sys_user_social WHERE source = $1 AND open_id = $2")
                .bind(source)
                .bind(open_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(|(id,)| UserId(id)))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    nickname: String,
    password: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    avatar: Option<String>,
    status: i16,
    dept_id: Option<i64>,
    pwd_reset_time: Option<DateTime<Utc>>,
    create_time: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId(self.id),
            username: self.username,
            nickname: self.nickname,
            password_hash: self.password.filter(|p| !p.is_empty()),
            email: self.email,
            phone: self.phone,
            avatar: self.avatar,
            status: EnableStatus::from_code(self.status),
            dept_id: self.dept_id.map(DeptId),
            pwd_reset_time: self.pwd_reset_time,
            created_at: self.create_time,
        }
    }
}
