//! Member Store Library
//!
//! Data-access layer for members and the teams they belong to, backed by
//! PostgreSQL through SQLx. Provides the domain entities, paging types,
//! repository interfaces and their PostgreSQL implementations.

pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

pub use errors::{DomainError, RepositoryError, RepositoryResult};
