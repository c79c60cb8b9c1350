//! 请求身份上下文

mod identity;
mod request_context;

pub use identity::*;
pub use request_context::*;
