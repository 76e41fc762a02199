//! # Taskforge API Server Library
//!
//! Core functionality for the Taskforge task-management API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers
//! - `service`: Task business rules and the optimistic-locking protocol

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod service;
