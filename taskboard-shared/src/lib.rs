//! # Taskboard Shared Library
//!
//! This crate contains shared types, database access, and business logic used
//! by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and response views
//! - `auth`: Authentication (JWT, passwords) and the authorization policy
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
