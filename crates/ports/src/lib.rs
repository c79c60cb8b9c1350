//! iam-ports - 抽象 trait 层
//!
//! 定义基础设施的抽象接口，由 adapters 提供实现

mod cache;

pub use cache::*;
