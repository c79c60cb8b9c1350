//! 领域层
//!
//! 认证授权引擎的核心模型、纯计算规则与仓储/外部服务接口

pub mod association;
pub mod auth_type;
pub mod client;
pub mod data_scope;
pub mod dept;
pub mod menu;
pub mod ports;
pub mod repository;
pub mod role;
pub mod user;

pub use association::*;
pub use auth_type::AuthType;
pub use client::Client;
pub use data_scope::*;
pub use dept::Dept;
pub use menu::*;
pub use ports::*;
pub use repository::*;
pub use role::{DataScope, Role};
pub use user::{SocialIdentity, User};
