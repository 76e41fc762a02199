//! # Taskforge Shared Library
//!
//! Shared data model and storage layer for the Taskforge task-management
//! API.
//!
//! ## Module Organization
//!
//! - `models`: the Task entity, its validation rules and store operations
//! - `db`: PostgreSQL connection pooling and migration tooling

pub mod db;
pub mod models;

/// Current version of the Taskforge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
