//! 测试公共设施
//!
//! 内存版缓存与仓储，以及按生产方式装配的引擎。

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use iam_auth_core::TokenService;
use iam_common::{DeptId, EnableStatus, MenuId, RoleId, UserId};
use iam_engine::api::http::AppState;
use iam_engine::application::authorization::{DataScopeResolver, PermissionAggregator, SuperAdmin};
use iam_engine::application::context::{ContextTracker, IdentityResolver};
use iam_engine::application::login::{
    AccountLoginHandler, AuthService, CodeChannel, EmailLoginHandler, LoginCodeStore,
    LoginStrategyRegistry, PhoneLoginHandler, SocialLoginHandler,
};
use iam_engine::domain::{
    AuthType, Client, ClientRepository, CredentialVerifier, DataScope, Dept, Menu, MenuRepository,
    MenuType, OrgUnitDirectory, Role, RoleAssociationStore, RoleDirectory, SocialAuthProvider,
    SocialBindingRepository, SocialIdentity, TokenIssuer, User, UserRepository,
};
use iam_engine::infrastructure::security::JwtTokenIssuer;
use iam_errors::{AppError, AppResult};
use iam_ports::CachePort;
use parking_lot::Mutex;

pub const SUPER_ADMIN_ID: i64 = 1;
pub const CLIENT_ID: &str = "web";

// ============================================================================
// 缓存
// ============================================================================

/// 内存缓存，`delete_if_equals` 在同一把锁内完成比较与删除
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 写操作次数（set/delete/expire/delete_if_equals 成功删除）
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries.lock().contains_key(key))
    }

    async fn delete_if_equals(&self, key: &str, expected_value: &str) -> AppResult<bool> {
        let mut entries = self.entries.lock();
        if entries.get(key).map(String::as_str) != Some(expected_value) {
            return Ok(false);
        }
        entries.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

// ============================================================================
// 仓储
// ============================================================================

/// 内存数据源，实现全部只读目录与角色关联存储
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    socials: Mutex<HashMap<(String, String), UserId>>,
    depts: Mutex<Vec<Dept>>,
    menus: Mutex<Vec<Menu>>,
    roles: Mutex<Vec<Role>>,
    user_roles: Mutex<HashMap<UserId, Vec<RoleId>>>,
    clients: Mutex<Vec<Client>>,
    /// 关联写入次数
    association_writes: AtomicUsize,
    /// 为 true 时关联替换失败（模拟事务回滚）
    fail_association_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().push(user);
    }

    pub fn bind_social(&self, source: &str, open_id: &str, user_id: UserId) {
        self.socials
            .lock()
            .insert((source.to_string(), open_id.to_string()), user_id);
    }

    pub fn add_dept(&self, id: i64, parent_id: i64) {
        self.depts.lock().push(Dept {
            id: DeptId(id),
            parent_id: DeptId(parent_id),
            name: format!("Dept {}", id),
            status: EnableStatus::Enabled,
        });
    }

    pub fn add_menu(&self, menu: Menu) {
        self.menus.lock().push(menu);
    }

    pub fn add_role(&self, role: Role) {
        self.roles.lock().push(role);
    }

    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) {
        self.user_roles.lock().entry(user_id).or_default().push(role_id);
    }

    pub fn add_client(&self, client: Client) {
        self.clients.lock().push(client);
    }

    pub fn association_writes(&self) -> usize {
        self.association_writes.load(Ordering::SeqCst)
    }

    pub fn fail_association_writes(&self, fail: bool) {
        self.fail_association_writes.store(fail, Ordering::SeqCst);
    }

    pub fn role(&self, role_id: RoleId) -> Option<Role> {
        self.roles.lock().iter().find(|r| r.id == role_id).cloned()
    }

    fn find_user(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().iter().find(|u| pred(u)).cloned()
    }

    fn replace_role<F>(&self, role_id: RoleId, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut Role),
    {
        if self.fail_association_writes.load(Ordering::SeqCst) {
            return Err(AppError::database("simulated write failure"));
        }
        let mut roles = self.roles.lock();
        let role = roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AppError::not_found("role"))?;
        apply(role);
        self.association_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.find_user(|u| u.id == id))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.find_user(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find_user(|u| u.email.as_deref() == Some(email)))
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        Ok(self.find_user(|u| u.phone.as_deref() == Some(phone)))
    }
}

#[async_trait]
impl SocialBindingRepository for MemoryStore {
    async fn find_user_id(&self, source: &str, open_id: &str) -> AppResult<Option<UserId>> {
        Ok(self
            .socials
            .lock()
            .get(&(source.to_string(), open_id.to_string()))
            .copied())
    }
}

#[async_trait]
impl RoleDirectory for MemoryStore {
    async fn roles_of_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let ids = self.user_roles.lock().get(&user_id).cloned().unwrap_or_default();
        let roles = self.roles.lock();
        Ok(roles.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }
}

#[async_trait]
impl OrgUnitDirectory for MemoryStore {
    async fn find_by_id(&self, id: DeptId) -> AppResult<Option<Dept>> {
        Ok(self.depts.lock().iter().find(|d| d.id == id).cloned())
    }

    async fn descendants(&self, id: DeptId) -> AppResult<BTreeSet<DeptId>> {
        let depts = self.depts.lock();
        let mut result = BTreeSet::new();
        let mut frontier = vec![id];
        while let Some(parent) = frontier.pop() {
            for d in depts.iter().filter(|d| d.parent_id == parent) {
                if d.id != id && result.insert(d.id) {
                    frontier.push(d.id);
                }
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl MenuRepository for MemoryStore {
    async fn find_by_ids(&self, ids: &BTreeSet<MenuId>) -> AppResult<Vec<Menu>> {
        Ok(self
            .menus
            .lock()
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<Menu>> {
        Ok(self.menus.lock().clone())
    }
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn find_by_client_id(&self, client_id: &str) -> AppResult<Option<Client>> {
        Ok(self
            .clients
            .lock()
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }
}

#[async_trait]
impl RoleAssociationStore for MemoryStore {
    async fn menu_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<MenuId>> {
        Ok(self.role(role_id).map(|r| r.menu_ids).unwrap_or_default())
    }

    async fn dept_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<DeptId>> {
        Ok(self.role(role_id).map(|r| r.dept_ids).unwrap_or_default())
    }

    async fn replace_menu_ids(&self, role_id: RoleId, menu_ids: &BTreeSet<MenuId>) -> AppResult<()> {
        self.replace_role(role_id, |r| r.menu_ids = menu_ids.clone())
    }

    async fn replace_dept_ids(&self, role_id: RoleId, dept_ids: &BTreeSet<DeptId>) -> AppResult<()> {
        self.replace_role(role_id, |r| r.dept_ids = dept_ids.clone())
    }
}

// ============================================================================
// 外部协作者
// ============================================================================

/// 存储格式为 `plain:<secret>` 的校验器
pub struct PlainVerifier;

#[async_trait]
impl CredentialVerifier for PlainVerifier {
    async fn verify(&self, secret: &str, stored_hash: &str) -> AppResult<bool> {
        Ok(stored_hash == format!("plain:{}", secret))
    }
}

/// 授权码即 open_id 的第三方认证
pub struct EchoSocialProvider;

#[async_trait]
impl SocialAuthProvider for EchoSocialProvider {
    async fn authenticate(
        &self,
        source: &str,
        code: &str,
        _state: Option<&str>,
    ) -> AppResult<SocialIdentity> {
        Ok(SocialIdentity {
            source: source.to_string(),
            open_id: code.to_string(),
            username: Some(format!("{}_{}", source, code)),
            nickname: None,
            avatar: None,
        })
    }
}

// ============================================================================
// 构造器
// ============================================================================

pub fn user(id: i64, username: &str, dept_id: Option<i64>) -> User {
    User {
        id: UserId(id),
        username: username.to_string(),
        nickname: username.to_uppercase(),
        password_hash: Some("plain:secret".to_string()),
        email: Some(format!("{}@example.com", username)),
        phone: Some(format!("1380000{:04}", id)),
        avatar: None,
        status: EnableStatus::Enabled,
        dept_id: dept_id.map(DeptId),
        pwd_reset_time: None,
        created_at: Utc::now(),
    }
}

pub fn role(id: i64, scope: DataScope, depts: &[i64], menus: &[i64]) -> Role {
    Role {
        id: RoleId(id),
        code: format!("role_{}", id),
        name: format!("Role {}", id),
        data_scope: scope,
        dept_ids: depts.iter().map(|d| DeptId(*d)).collect(),
        menu_ids: menus.iter().map(|m| MenuId(*m)).collect(),
    }
}

pub fn menu(id: i64, parent_id: i64, menu_type: MenuType, permission: Option<&str>) -> Menu {
    Menu {
        id: MenuId(id),
        parent_id: MenuId(parent_id),
        title: format!("Menu {}", id),
        menu_type,
        path: Some(format!("/m{}", id)),
        name: None,
        component: None,
        redirect: None,
        icon: None,
        is_external: false,
        is_cache: false,
        is_hidden: false,
        permission: permission.map(str::to_string),
        sort: id as i32,
        status: EnableStatus::Enabled,
    }
}

pub fn client(auth_types: &[AuthType]) -> Client {
    Client {
        client_id: CLIENT_ID.to_string(),
        client_type: "PC".to_string(),
        auth_types: auth_types.iter().copied().collect(),
        timeout_secs: Some(1800),
        status: EnableStatus::Enabled,
    }
}

// ============================================================================
// 引擎装配
// ============================================================================

pub struct Engine {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub codes: Arc<LoginCodeStore>,
    pub auth_service: Arc<AuthService>,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub data_scope: Arc<DataScopeResolver>,
    pub permissions: Arc<PermissionAggregator>,
    pub identity_resolver: Arc<IdentityResolver>,
    pub contexts: ContextTracker,
}

impl Engine {
    /// `captcha_enabled` 控制账号登录是否校验图形验证码
    pub fn new(store: Arc<MemoryStore>, captcha_enabled: bool) -> Self {
        let cache = MemoryCache::new();
        let codes = Arc::new(LoginCodeStore::new(
            cache.clone(),
            Duration::from_secs(300),
            Duration::from_secs(120),
        ));

        let registry = LoginStrategyRegistry::builder()
            .register(
                AuthType::Account,
                Arc::new(AccountLoginHandler::new(
                    store.clone(),
                    Arc::new(PlainVerifier),
                    codes.clone(),
                    captcha_enabled,
                )),
            )
            .register(
                AuthType::Email,
                Arc::new(EmailLoginHandler::new(store.clone(), codes.clone())),
            )
            .register(
                AuthType::Phone,
                Arc::new(PhoneLoginHandler::new(store.clone(), codes.clone())),
            )
            .register(
                AuthType::Social,
                Arc::new(SocialLoginHandler::new(
                    store.clone(),
                    store.clone(),
                    Arc::new(EchoSocialProvider),
                )),
            )
            .build()
            .unwrap();

        let tokens = TokenService::new(
            "integration-test-secret-with-enough-bytes",
            3600,
            "iam-engine".to_string(),
            "admin-console".to_string(),
        );
        let token_issuer: Arc<dyn TokenIssuer> =
            Arc::new(JwtTokenIssuer::new(tokens, cache.clone()));

        let super_admin = SuperAdmin(UserId(SUPER_ADMIN_ID));
        let data_scope = Arc::new(DataScopeResolver::new(store.clone(), super_admin));
        let permissions = Arc::new(PermissionAggregator::new(
            store.clone(),
            store.clone(),
            super_admin,
        ));
        let identity_resolver = Arc::new(IdentityResolver::new(
            store.clone(),
            store.clone(),
            data_scope.clone(),
            permissions.clone(),
            0,
        ));

        let auth_service = Arc::new(AuthService::new(
            Arc::new(registry),
            store.clone(),
            token_issuer.clone(),
        ));

        Self {
            store,
            cache,
            codes,
            auth_service,
            token_issuer,
            data_scope,
            permissions,
            identity_resolver,
            contexts: ContextTracker::new(),
        }
    }

    /// 预置邮箱/手机号登录验证码
    pub async fn issue_login_code(&self, identifier: &str) -> String {
        self.codes
            .issue(CodeChannel::LoginCode, identifier)
            .await
            .unwrap()
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            auth_service: self.auth_service.clone(),
            token_issuer: self.token_issuer.clone(),
            identity_loader: self.identity_resolver.clone(),
            permissions: self.permissions.clone(),
            org_units: self.store.clone(),
            contexts: self.contexts.clone(),
            health_indicators: Vec::new(),
            metrics: None,
        }
    }
}
