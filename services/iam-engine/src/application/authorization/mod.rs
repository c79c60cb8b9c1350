//! 授权：数据权限与权限码

mod data_filter;
mod data_scope;
mod permission;

pub use data_filter::*;
pub use data_scope::*;
pub use permission::*;
