//! # TaskMate Shared Library
//!
//! Core of the TaskMate task-management backend: the data model, storage,
//! credentials, ownership checks, cascade deletion and the operations the
//! API server exposes.
//!
//! ## Module Organization
//!
//! - `models`: Records and their PostgreSQL queries
//! - `store`: Transactional entity store (PostgreSQL and in-memory)
//! - `auth`: Passwords, tokens, principals, ownership checks
//! - `cascade`: Ordered removal of tasks and accounts with their dependents
//! - `services`: One function per operation, returning tagged outcomes
//! - `error`: The tagged outcome type
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod cascade;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TaskMate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
