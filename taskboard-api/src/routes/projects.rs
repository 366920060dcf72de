/// Project endpoints
///
/// Listing is scoped by role: admins see everything, everyone else sees only
/// the projects they own or belong to. Single-project access goes through
/// the authorization policy with a freshly loaded access snapshot.
///
/// # Endpoints
///
/// - `GET /api/projects` - List visible projects
/// - `POST /api/projects` - Create a project (responsable or admin)
/// - `GET /api/projects/:id` - Fetch one project, populated
/// - `PUT /api/projects/:id` - Update (owner or admin)
/// - `DELETE /api/projects/:id` - Delete (owner or admin)
/// - `PUT /api/projects/:id/members` - Add a member (owner or admin)

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
use chrono::NaiveDate;
use serde::Deserialize;
use taskboard_shared::{
    auth::{middleware::Actor, policy},
    models::{
        membership::ProjectMember,
        project::{CreateProject, Project, ProjectDetail, ProjectStatus, UpdateProject},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 100, message = "Please add a project name"))]
    pub name: String,

    /// Description
    #[validate(length(min = 1, max = 500, message = "Please add a description"))]
    pub description: String,

    /// Delivery deadline
    pub deadline: NaiveDate,

    /// Initial progress (defaults to 0)
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,

    /// Image reference
    pub image: Option<String>,

    /// Initial status
    pub status: Option<ProjectStatus>,
}

/// Update project request
///
/// `version` opts into compare-and-swap: when present the update only
/// applies if the stored version still matches, otherwise 409.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 1, max = 100, message = "Please add a project name"))]
    pub name: Option<String>,

    /// New description
    #[validate(length(min = 1, max = 500, message = "Please add a description"))]
    pub description: Option<String>,

    /// New deadline
    pub deadline: Option<NaiveDate>,

    /// New progress
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,

    /// New image reference
    pub image: Option<String>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// Expected version for compare-and-swap (optional)
    pub version: Option<i32>,
}

/// Add member request
///
/// `user_id` is optional in the type only so its absence can produce the
/// contract's message instead of a generic deserialization error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMemberRequest {
    /// The user to add; `userId` is accepted for older clients
    #[serde(alias = "userId")]
    pub user_id: Option<Uuid>,
}

/// Loads a project or 404s with the contract message
async fn load_project(state: &AppState, id: Uuid) -> Result<Project, ApiError> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// List visible projects
///
/// Admins get every project; others get the ones they own or are members
/// of. Results are fully populated.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ApiResponse<Vec<ProjectDetail>>>> {
    let projects = if actor.is_admin() {
        Project::list_all(&state.db).await?
    } else {
        Project::list_for_user(&state.db, actor.id).await?
    };

    let details = ProjectDetail::load_many(&state.db, projects).await?;

    Ok(Json(ApiResponse::list(details)))
}

/// Fetch one project, populated
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ProjectDetail>>> {
    let project = load_project(&state, id).await?;

    let access = project.access(&state.db).await?;
    policy::require_read_project(&actor, &access)?;

    let detail = ProjectDetail::load(&state.db, project).await?;

    Ok(Json(ApiResponse::new(detail)))
}

/// Create a project
///
/// Only responsables and admins may create; the caller becomes the owner
/// regardless of anything in the payload.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProjectDetail>>)> {
    policy::require_create_project(actor.role)?;
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            deadline: req.deadline,
            progress: req.progress,
            image: req.image,
            status: req.status,
            owner_id: actor.id,
        },
    )
    .await?;

    let detail = ProjectDetail::load(&state.db, project).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(detail))))
}

/// Update a project
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ApiResponse<ProjectDetail>>> {
    let project = load_project(&state, id).await?;

    let access = project.access(&state.db).await?;
    policy::require_update_project(&actor, &access)?;

    req.validate()?;

    let expected_version = req.version;
    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            deadline: req.deadline,
            progress: req.progress,
            image: req.image,
            status: req.status,
        },
        expected_version,
    )
    .await?
    // The row existed a moment ago, so None means the version moved on
    .ok_or_else(|| {
        ApiError::Conflict("Project has been modified by another request".to_string())
    })?;

    let detail = ProjectDetail::load(&state.db, updated).await?;

    Ok(Json(ApiResponse::new(detail)))
}

/// Delete a project
///
/// Membership rows go with it; the project's tasks are left in place and
/// keep working through the task endpoints.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let project = load_project(&state, id).await?;

    let access = project.access(&state.db).await?;
    policy::require_delete_project(&actor, &access)?;

    Project::delete(&state.db, id).await?;

    Ok(Json(response::empty()))
}

/// Add a member to a project
///
/// # Errors
///
/// - `400 Bad Request`: No user id, or the user is already a member
/// - `403 Forbidden`: Caller is neither owner nor admin
/// - `404 Not Found`: Project or user does not exist
pub async fn add_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ApiResponse<ProjectDetail>>> {
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Please provide a user ID".to_string()))?;

    let project = load_project(&state, id).await?;

    let access = project.access(&state.db).await?;
    policy::require_add_member(&actor, &access)?;

    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if access.is_member(user_id) {
        return Err(ApiError::BadRequest(
            "User is already a member of this project".to_string(),
        ));
    }

    ProjectMember::add(&state.db, id, user_id).await?;

    let detail = ProjectDetail::load(&state.db, project).await?;

    Ok(Json(ApiResponse::new(detail)))
}
