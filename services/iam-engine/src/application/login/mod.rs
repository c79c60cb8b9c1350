//! 多方式登录

mod code_store;
mod handler;
mod handlers;
mod registry;
mod request;
mod service;

pub use code_store::*;
pub use handler::*;
pub use handlers::*;
pub use registry::*;
pub use request::*;
pub use service::*;
