/// Task endpoints
///
/// Tasks are created under a project (`POST /api/projects/:id/tasks`) and
/// addressed directly afterwards. Because a task can outlive its project,
/// every handler that consults the parent treats it as optional.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List visible tasks
/// - `GET /api/tasks/:id` - Fetch one task, populated
/// - `PUT /api/tasks/:id` - Update (creator, project owner, or admin)
/// - `DELETE /api/tasks/:id` - Delete (creator, project owner, or admin)
/// - `GET /api/projects/:id/tasks` - List a project's tasks
/// - `POST /api/projects/:id/tasks` - Create a task in a project

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
    auth::{middleware::Actor, policy, policy::ProjectAccess},
    models::{
        project::Project,
        task::{CreateTask, Task, TaskDetail, TaskPriority, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    /// Title
    #[validate(length(min = 1, max = 100, message = "Please add a task title"))]
    pub title: String,

    /// Optional description
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,

    /// Initial status
    pub status: Option<TaskStatus>,

    /// Priority
    pub priority: Option<TaskPriority>,

    /// Due date
    pub due_date: NaiveDate,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,
}

/// Update task request
///
/// The double Options on `description` and `assigned_to` distinguish "leave
/// alone" (absent) from "clear" (explicit null). `version` opts into
/// compare-and-swap.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 100, message = "Please add a task title"))]
    pub title: Option<String>,

    /// New description (null clears it)
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<NaiveDate>,

    /// New assignee (null unassigns)
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    /// Expected version for compare-and-swap (optional)
    pub version: Option<i32>,
}

/// Keeps "field absent" and "field null" apart during deserialization
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Loads a task or 404s with the contract message
async fn load_task(state: &AppState, id: Uuid) -> Result<Task, ApiError> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Builds the access snapshot of a task's parent project, if it still exists
async fn parent_access(
    state: &AppState,
    project_id: Uuid,
) -> Result<Option<ProjectAccess>, ApiError> {
    match Project::find_by_id(&state.db, project_id).await? {
        Some(project) => Ok(Some(project.access(&state.db).await?)),
        None => Ok(None),
    }
}

/// List visible tasks
///
/// Admins get every task; others get the ones they created or are assigned
/// to. Tasks reachable only through project membership show up under the
/// project's own task listing instead.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ApiResponse<Vec<TaskDetail>>>> {
    let tasks = if actor.is_admin() {
        Task::list_all(&state.db).await?
    } else {
        Task::list_for_user(&state.db, actor.id).await?
    };

    let details = TaskDetail::load_many(&state.db, tasks).await?;

    Ok(Json(ApiResponse::list(details)))
}

/// List a project's tasks
///
/// Only the project's existence is checked here; any authenticated caller
/// who knows the project id gets its full task list, matching the behavior
/// of the system this replaces.
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<TaskDetail>>>> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;
    let details = TaskDetail::load_many(&state.db, tasks).await?;

    Ok(Json(ApiResponse::list(details)))
}

/// Fetch one task, populated
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = load_task(&state, id).await?;

    let access = parent_access(&state, task.project_id).await?;
    policy::require_read_task(&actor, task.created_by, task.assigned_to, access.as_ref())?;

    let detail = TaskDetail::load(&state.db, task).await?;

    Ok(Json(ApiResponse::new(detail)))
}

/// Create a task in a project
///
/// The parent comes from the path and the creator from the actor; neither
/// can be set through the payload.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskDetail>>)> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let access = project.access(&state.db).await?;
    policy::require_create_task(&actor, &access)?;

    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            project_id,
            assigned_to: req.assigned_to,
            created_by: actor.id,
        },
    )
    .await?;

    let detail = TaskDetail::load(&state.db, task).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(detail))))
}

/// Update a task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = load_task(&state, id).await?;

    let project_owner = Project::find_by_id(&state.db, task.project_id)
        .await?
        .map(|p| p.owner_id);
    policy::require_update_task(&actor, task.created_by, project_owner)?;

    req.validate()?;

    let expected_version = req.version;
    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
        },
        expected_version,
    )
    .await?
    // The row existed a moment ago, so None means the version moved on
    .ok_or_else(|| ApiError::Conflict("Task has been modified by another request".to_string()))?;

    let detail = TaskDetail::load(&state.db, updated).await?;

    Ok(Json(ApiResponse::new(detail)))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let task = load_task(&state, id).await?;

    let project_owner = Project::find_by_id(&state.db, task.project_id)
        .await?
        .map(|p| p.owner_id);
    policy::require_delete_task(&actor, task.created_by, project_owner)?;

    Task::delete(&state.db, id).await?;

    Ok(Json(response::empty()))
}
