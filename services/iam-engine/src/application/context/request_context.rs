//! 请求身份上下文
//!
//! 状态：Empty → Populated(主体) → Empty。
//! 进入请求时由中间件在令牌校验通过后填充；角色与权限在首次访问时惰性解析，
//! 并只在本次请求内复用。`RequestScope` 保证任何退出路径都会清空上下文。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use iam_common::UserId;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use super::identity::{IdentityResolver, ResolvedIdentity};
use crate::domain::TokenSubject;
use crate::error::{AuthError, AuthResult};

/// 身份加载
#[async_trait]
pub trait IdentityLoader: Send + Sync {
    async fn load(&self, user_id: UserId) -> AuthResult<ResolvedIdentity>;
}

#[async_trait]
impl IdentityLoader for IdentityResolver {
    async fn load(&self, user_id: UserId) -> AuthResult<ResolvedIdentity> {
        self.resolve(user_id).await
    }
}

/// 已填充上下文计数
#[derive(Debug, Clone, Default)]
pub struct ContextTracker {
    active: Arc<AtomicUsize>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前处于 Populated 状态的上下文数量
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

struct Populated {
    subject: TokenSubject,
    resolved: Arc<OnceCell<Arc<ResolvedIdentity>>>,
}

/// 请求身份上下文句柄
///
/// 克隆得到的是同一个上下文；上下文清空后所有句柄都看到 Empty。
#[derive(Clone)]
pub struct RequestIdentityContext {
    slot: Arc<Mutex<Option<Populated>>>,
    loader: Arc<dyn IdentityLoader>,
    tracker: ContextTracker,
}

impl RequestIdentityContext {
    pub fn new(loader: Arc<dyn IdentityLoader>, tracker: ContextTracker) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            loader,
            tracker,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// 填充上下文，返回负责清空的作用域守卫
    pub fn enter(&self, subject: TokenSubject) -> AuthResult<RequestScope> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(AuthError::ContextAlreadyPopulated);
        }
        *slot = Some(Populated {
            subject,
            resolved: Arc::new(OnceCell::new()),
        });
        self.tracker.active.fetch_add(1, Ordering::SeqCst);

        Ok(RequestScope {
            context: self.clone(),
            closed: false,
        })
    }

    /// 令牌主体
    pub fn subject(&self) -> AuthResult<TokenSubject> {
        self.slot
            .lock()
            .as_ref()
            .map(|p| p.subject.clone())
            .ok_or(AuthError::Unauthenticated)
    }

    /// 完整身份，首次访问时加载
    pub async fn identity(&self) -> AuthResult<Arc<ResolvedIdentity>> {
        let (user_id, cell) = {
            let slot = self.slot.lock();
            let populated = slot.as_ref().ok_or(AuthError::Unauthenticated)?;
            (populated.subject.user_id, populated.resolved.clone())
        };

        let resolved = cell
            .get_or_try_init(|| async {
                self.loader.load(user_id).await.map(Arc::new)
            })
            .await?;
        Ok(resolved.clone())
    }

    /// 清空上下文；解析出的身份仍被外部持有时视为泄漏
    fn clear(&self) -> AuthResult<()> {
        let Some(populated) = self.slot.lock().take() else {
            return Ok(());
        };
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);

        let cell_refs = Arc::strong_count(&populated.resolved);
        let identity_refs = populated.resolved.get().map(Arc::strong_count).unwrap_or(0);
        if cell_refs > 1 || identity_refs > 1 {
            return Err(AuthError::ContextLeaked(format!(
                "identity of user {} still referenced after request end (loader refs: {}, identity refs: {})",
                populated.subject.user_id,
                cell_refs - 1,
                identity_refs.saturating_sub(1)
            )));
        }
        Ok(())
    }
}

/// 作用域守卫
///
/// 正常路径调用 `close` 并处理其错误；取消、超时或 panic 时由 `Drop` 兜底清空。
#[must_use = "the request scope must be closed to surface teardown failures"]
pub struct RequestScope {
    context: RequestIdentityContext,
    closed: bool,
}

impl RequestScope {
    pub fn context(&self) -> &RequestIdentityContext {
        &self.context
    }

    pub fn close(mut self) -> AuthResult<()> {
        self.closed = true;
        self.context.clear()
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match self.context.clear() {
            Ok(()) => debug!("Request scope dropped before close, context cleared"),
            Err(e) => error!(error = %e, "Request scope teardown failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use iam_common::EnableStatus;
    use std::collections::BTreeSet;
    use std::sync::atomic::AtomicUsize;

    use crate::domain::{EffectiveDataScope, User};

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl IdentityLoader for CountingLoader {
        async fn load(&self, user_id: UserId) -> AuthResult<ResolvedIdentity> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(ResolvedIdentity {
                user: User {
                    id: user_id,
                    username: "alice".to_string(),
                    nickname: "Alice".to_string(),
                    password_hash: None,
                    email: None,
                    phone: None,
                    avatar: None,
                    status: EnableStatus::Enabled,
                    dept_id: None,
                    pwd_reset_time: None,
                    created_at: Utc::now(),
                },
                roles: Vec::new(),
                role_codes: BTreeSet::new(),
                permissions: BTreeSet::new(),
                data_scope: EffectiveDataScope::unrestricted(),
                super_admin: false,
                password_expired: false,
            })
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: UserId(2),
            client_id: "web".to_string(),
            token_id: "jti-1".to_string(),
            remaining_secs: 60,
        }
    }

    fn context() -> (RequestIdentityContext, Arc<CountingLoader>, ContextTracker) {
        let loader = Arc::new(CountingLoader::default());
        let tracker = ContextTracker::new();
        let ctx = RequestIdentityContext::new(loader.clone(), tracker.clone());
        (ctx, loader, tracker)
    }

    #[tokio::test]
    async fn test_lifecycle_empty_populated_empty() {
        let (ctx, _, tracker) = context();
        assert!(!ctx.is_populated());

        let scope = ctx.enter(subject()).unwrap();
        assert!(ctx.is_populated());
        assert_eq!(tracker.active(), 1);
        assert_eq!(ctx.subject().unwrap().user_id, UserId(2));

        scope.close().unwrap();
        assert!(!ctx.is_populated());
        assert_eq!(tracker.active(), 0);
        assert!(matches!(ctx.subject(), Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_identity_is_loaded_once_per_request() {
        let (ctx, loader, _) = context();
        let scope = ctx.enter(subject()).unwrap();

        let first = ctx.identity().await.unwrap();
        let second = ctx.identity().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        drop((first, second));

        scope.close().unwrap();

        // 新请求重新加载
        let scope = ctx.enter(subject()).unwrap();
        let _ = ctx.identity().await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        scope.close().unwrap();
    }

    #[tokio::test]
    async fn test_double_enter_is_rejected() {
        let (ctx, _, _) = context();
        let scope = ctx.enter(subject()).unwrap();
        assert!(matches!(
            ctx.enter(subject()),
            Err(AuthError::ContextAlreadyPopulated)
        ));
        scope.close().unwrap();
    }

    #[tokio::test]
    async fn test_retained_identity_is_reported_as_leak() {
        let (ctx, _, tracker) = context();
        let scope = ctx.enter(subject()).unwrap();
        let retained = ctx.identity().await.unwrap();

        let err = scope.close().unwrap_err();
        assert!(matches!(err, AuthError::ContextLeaked(_)));
        assert!(!ctx.is_populated());
        assert_eq!(tracker.active(), 0);
        drop(retained);
    }

    #[tokio::test]
    async fn test_drop_without_close_clears() {
        let (ctx, _, tracker) = context();
        {
            let _scope = ctx.enter(subject()).unwrap();
            assert!(ctx.is_populated());
        }
        assert!(!ctx.is_populated());
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn test_identity_requires_populated_context() {
        let (ctx, _, _) = context();
        assert!(matches!(ctx.identity().await, Err(AuthError::Unauthenticated)));
    }
}
