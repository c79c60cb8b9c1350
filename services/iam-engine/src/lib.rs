//! 认证授权引擎
//!
//! 多方式登录、数据权限解析、权限聚合与请求身份上下文。

pub mod api;
pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod error;
pub mod infrastructure;
