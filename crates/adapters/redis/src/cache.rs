//! Redis Cache 实现

use async_trait::async_trait;
use iam_errors::{AppError, AppResult};
use iam_ports::CachePort;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;
use tracing::debug;

/// 比较并删除：GET 与 DEL 在同一脚本内执行，保证一次性凭证只能被消费一次
const COMPARE_AND_DELETE: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
";

/// Redis Cache
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    compare_and_delete: Script,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            compare_and_delete: Script::new(COMPARE_AND_DELETE),
        }
    }

    /// 连接探活（用于健康检查）
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        crate::check_connection(&mut conn).await
    }
}

fn map_redis_error(op: &str, e: redis::RedisError) -> AppError {
    AppError::cache(format!("Redis {} failed: {}", op, e))
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| map_redis_error("get", e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        match ttl {
            // SETEX 不接受 0 秒，亚秒级 TTL 向上取整
            Some(duration) => conn
                .set_ex(key, value, duration.as_secs().max(1))
                .await
                .map_err(|e| map_redis_error("set", e)),
            None => conn
                .set(key, value)
                .await
                .map_err(|e| map_redis_error("set", e)),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del(key).await.map_err(|e| map_redis_error("delete", e))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key)
            .await
            .map_err(|e| map_redis_error("exists", e))
    }

    async fn delete_if_equals(&self, key: &str, expected_value: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();

        let deleted: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected_value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("delete_if_equals", e))?;

        debug!(key = %key, deleted = deleted > 0, "Compare-and-delete executed");
        Ok(deleted > 0)
    }
}
