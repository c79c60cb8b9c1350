//! Cache trait 定义

use async_trait::async_trait;
use iam_errors::AppResult;
use std::time::Duration;

/// 缓存 trait
///
/// 键由调用方按用途加前缀（如 `login-code:`、`auth:blacklist:`），
/// 淘汰策略由具体实现决定。
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置缓存值
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// 删除缓存
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// 检查是否存在
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// 仅当值等于 `expected_value` 时删除，返回是否删除
    ///
    /// 必须是单个原子操作：并发调用同一键值时最多一个返回 `true`。
    async fn delete_if_equals(&self, key: &str, expected_value: &str) -> AppResult<bool>;
}
