//! PostgreSQL 持久化实现

mod postgres_association_store;
mod postgres_client_repository;
mod postgres_dept_repository;
mod postgres_menu_repository;
mod postgres_role_repository;
mod postgres_user_repository;

pub use postgres_association_store::*;
pub use postgres_client_repository::*;
pub use postgres_dept_repository::*;
pub use postgres_menu_repository::*;
pub use postgres_role_repository::*;
pub use postgres_user_repository::*;
