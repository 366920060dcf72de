/// Authentication and authorization for Taskboard
///
/// # Modules
///
/// - `jwt`: token creation and validation (HS256 access + refresh)
/// - `password`: Argon2id hashing and verification
/// - `middleware`: the [`middleware::Actor`] request context
/// - `policy`: the pure authorization decision functions
///
/// The split matters: `middleware` establishes *who* is calling, `policy`
/// decides *what* they may do, and the two only meet inside the route
/// handlers.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
