//! 仓储接口

use std::collections::BTreeSet;

use async_trait::async_trait;
use iam_common::{DeptId, MenuId, RoleId, UserId};
use iam_errors::AppResult;

use super::client::Client;
use super::dept::Dept;
use super::menu::Menu;
use super::role::Role;
use super::user::User;

/// 用户仓储（只读）
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>>;
}

/// 第三方账号绑定
#[async_trait]
pub trait SocialBindingRepository: Send + Sync {
    /// 查找绑定了该第三方身份的用户
    async fn find_user_id(&self, source: &str, open_id: &str) -> AppResult<Option<UserId>>;
}

/// 角色目录
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// 用户拥有的全部角色（含自定义部门与菜单关联）
    async fn roles_of_user(&self, user_id: UserId) -> AppResult<Vec<Role>>;
}

/// 组织单元目录
#[async_trait]
pub trait OrgUnitDirectory: Send + Sync {
    async fn find_by_id(&self, id: DeptId) -> AppResult<Option<Dept>>;

    /// 所有下级部门（传递闭包，不含自身）
    async fn descendants(&self, id: DeptId) -> AppResult<BTreeSet<DeptId>>;
}

/// 菜单仓储
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn find_by_ids(&self, ids: &BTreeSet<MenuId>) -> AppResult<Vec<Menu>>;

    async fn list_all(&self) -> AppResult<Vec<Menu>>;
}

/// 终端仓储
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> AppResult<Option<Client>>;
}

/// 角色关联存储
///
/// `replace_*` 必须在单个事务内先删后插，读者只能看到完整的旧集合或新集合。
#[async_trait]
pub trait RoleAssociationStore: Send + Sync {
    async fn menu_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<MenuId>>;

    async fn dept_ids(&self, role_id: RoleId) -> AppResult<BTreeSet<DeptId>>;

    async fn replace_menu_ids(&self, role_id: RoleId, menu_ids: &BTreeSet<MenuId>) -> AppResult<()>;

    async fn replace_dept_ids(&self, role_id: RoleId, dept_ids: &BTreeSet<DeptId>) -> AppResult<()>;
}
