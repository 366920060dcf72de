/// User administration endpoints
///
/// Every handler here is admin-only; the role check happens first thing in
/// each handler so the denial message can name the caller's role.
///
/// # Endpoints
///
/// - `GET /api/users` - List all users
/// - `POST /api/users` - Create a user with an explicit role
/// - `GET /api/users/:id` - Fetch one user
/// - `PUT /api/users/:id` - Update name, email, password, or role
/// - `DELETE /api/users/:id` - Delete a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{middleware::Actor, password},
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use uuid::Uuid;
use validator::Validate;

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Please add a name"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Please add a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role; defaults to "user"
    pub role: Option<UserRole>,
}

/// Update user request (admin)
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Please add a name"))]
    pub name: Option<String>,

    /// New email address
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// New role
    pub role: Option<UserRole>,
}

fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            actor.role.as_str()
        )))
    }
}

/// List all users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    require_admin(&actor)?;

    let users = User::list(&state.db).await?;

    Ok(Json(ApiResponse::list(users)))
}

/// Create a user (admin only)
///
/// Unlike registration this accepts any role directly, which is how new
/// responsables are provisioned.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    require_admin(&actor)?;
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

/// Fetch one user (admin only)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    require_admin(&actor)?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(user)))
}

/// Update a user (admin only)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    require_admin(&actor)?;
    req.validate()?;

    let password_hash = match &req.password {
        Some(p) => {
            password::validate_password_strength(p).map_err(ApiError::BadRequest)?;
            Some(password::hash_password(p)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(user)))
}

/// Delete a user (admin only)
///
/// Tasks assigned to the user lose their assignee. Deleting someone who
/// still owns projects or created tasks trips the foreign keys and comes
/// back as a 400; those records have to be reassigned or removed first.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    require_admin(&actor)?;

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(response::empty()))
}
