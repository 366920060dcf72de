/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `users`: User administration (admin only)
/// - `projects`: Project CRUD and membership
/// - `tasks`: Task CRUD, global and nested under projects

pub mod health;
pub mod auth;
pub mod users;
pub mod projects;
pub mod tasks;
