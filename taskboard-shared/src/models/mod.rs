/// Database models for Taskboard
///
/// This module contains all database models, their CRUD operations, and the
/// populated response views built from them.
///
/// # Models
///
/// - `user`: User accounts with application roles
/// - `project`: Projects owned by a user, with a member list
/// - `membership`: Project membership association rows
/// - `task`: Tasks belonging to a project
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, User, UserRole};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Responsable,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod project;
pub mod task;
pub mod user;
