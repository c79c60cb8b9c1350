//! 应用层

pub mod authorization;
pub mod context;
pub mod login;
