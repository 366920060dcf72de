/// HTTP middleware
///
/// - `auth`: bearer-token guard that resolves the calling [`Actor`]
///
/// [`Actor`]: taskboard_shared::auth::middleware::Actor

pub mod auth;
