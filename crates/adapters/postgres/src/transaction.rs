//! PostgreSQL 事务管理模块

use iam_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, warn};

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开始事务
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))
    }

    /// 提交事务
    pub async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    /// 回滚事务
    pub async fn rollback(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.rollback().await.map_err(|e| {
            warn!(error = %e, "Transaction rollback failed");
            AppError::database(format!("Failed to rollback transaction: {}", e))
        })
    }

    /// 回滚并返回导致回滚的原始错误
    ///
    /// 回滚本身失败只记录日志，调用方拿到的始终是 `cause`。
    pub async fn abort(tx: Transaction<'static, Postgres>, cause: AppError) -> AppError {
        retain_cause(cause, Self::rollback(tx).await)
    }
}

fn retain_cause(cause: AppError, rollback: AppResult<()>) -> AppError {
    if let Err(e) = rollback {
        error!(cause = %cause, rollback_error = %e, "Rollback failed after statement error");
    }
    cause
}
