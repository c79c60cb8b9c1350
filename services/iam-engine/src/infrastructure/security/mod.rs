//! 凭证校验、令牌签发与第三方认证

mod jwt;
mod password;
mod social;

pub use jwt::*;
pub use password::*;
pub use social::*;
