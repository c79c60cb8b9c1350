//! PostgreSQL 终端 Repository 实现

use std::collections::BTreeSet;

use async_trait::async_trait;
use iam_adapter_postgres::map_sqlx_error;
use iam_common::EnableStatus;
use iam_errors::AppResult;
use sqlx::PgPool;
use tracing::warn;

use crate::domain::{AuthType, Client, ClientRepository};

pub struct PostgresClientRepository {
    pool: PgPool,
}

impl PostgresClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> AppResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT client_id, client_type, auth_type, timeout, status FROM sys_client WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ClientRow::into_client))
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    client_id: String,
    client_type: String,
    auth_type: Vec<String>,
    timeout: Option<i64>,
    status: i16,
}

impl ClientRow {
    fn into_client(self) -> Client {
        let auth_types: BTreeSet<AuthType> = self
            .auth_type
            .iter()
            .filter_map(|raw| match raw.parse::<AuthType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    warn!(client_id = %self.client_id, auth_type = %raw, "Ignoring unknown auth type");
                    None
                }
            })
            .collect();

        Client {
            client_id: self.client_id,
            client_type: self.client_type,
            auth_types,
            timeout_secs: self.timeout,
            status: EnableStatus::from_code(self.status),
        }
    }
}
