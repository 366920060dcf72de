/// Request authentication context
///
/// After the API's JWT middleware validates a bearer token it loads the user
/// row and inserts an [`Actor`] into the request extensions. Handlers extract
/// it with axum's `Extension` and pass it explicitly into the authorization
/// policy; there is no ambient "current user" anywhere.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::Actor;
///
/// async fn handler(Extension(actor): Extension<Actor>) -> String {
///     format!("User: {} ({})", actor.id, actor.role.as_str())
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// The authenticated identity making a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated user ID
    pub id: Uuid,

    /// Application role, loaded fresh from the database per request
    pub role: UserRole,
}

impl Actor {
    /// Builds the actor for a loaded user row
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Whether this actor bypasses ownership and membership checks
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for the authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header on the request
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a Bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token was valid but the user no longer exists
    #[error("Unknown user")]
    UnknownUser,

    /// Database failure while loading the user
    #[error("Database error: {0}")]
    DatabaseError(String),
}
