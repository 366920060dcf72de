/// Task model, database operations, and populated views
///
/// A task belongs to exactly one project, records who created it, and may be
/// delegated to an assignee. Status and priority use the French labels of
/// the product.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('En cours', 'Terminé', 'En retard');
/// CREATE TYPE task_priority AS ENUM ('Basse', 'Moyenne', 'Haute');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     status task_status NOT NULL DEFAULT 'En cours',
///     priority task_priority NOT NULL DEFAULT 'Moyenne',
///     due_date DATE NOT NULL,
///     project_id UUID NOT NULL,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     version INT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `project_id` intentionally has no foreign key: deleting a project leaves
/// its tasks behind, matching the observed behavior of the system this
/// replaces. The population layer therefore treats the project reference as
/// possibly unresolvable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::user::UserSummary;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Work in progress (default)
    #[sqlx(rename = "En cours")]
    #[serde(rename = "En cours")]
    EnCours,

    /// Finished
    #[sqlx(rename = "Terminé")]
    #[serde(rename = "Terminé")]
    Termine,

    /// Past its due date
    #[sqlx(rename = "En retard")]
    #[serde(rename = "En retard")]
    EnRetard,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::EnCours
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    /// Low
    #[sqlx(rename = "Basse")]
    #[serde(rename = "Basse")]
    Basse,

    /// Medium (default)
    #[sqlx(rename = "Moyenne")]
    #[serde(rename = "Moyenne")]
    Moyenne,

    /// High
    #[sqlx(rename = "Haute")]
    #[serde(rename = "Haute")]
    Haute,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Moyenne
    }
}

/// Task model as stored in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title (max 100 chars)
    pub title: String,

    /// Optional description (max 500 chars)
    pub description: Option<String>,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Due date
    pub due_date: NaiveDate,

    /// Parent project ID, set at creation and never reassigned
    pub project_id: Uuid,

    /// Assignee, if the task has been delegated
    pub assigned_to: Option<Uuid>,

    /// The user who created the task
    pub created_by: Uuid,

    /// Optimistic concurrency version, bumped on every update
    pub version: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// `project_id` comes from the route path and `created_by` from the
/// authenticated actor, never from the request payload.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to "En cours")
    pub status: Option<TaskStatus>,

    /// Priority (defaults to "Moyenne")
    pub priority: Option<TaskPriority>,

    /// Due date
    pub due_date: NaiveDate,

    /// Parent project, injected from the route
    pub project_id: Uuid,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Creator, injected from the actor
    pub created_by: Uuid,
}

/// Input for updating an existing task
///
/// Only non-None fields are written. The outer Option marks presence, the
/// inner one allows clearing a nullable column.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (Some(None) clears it)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<NaiveDate>,

    /// New assignee (Some(None) unassigns)
    pub assigned_to: Option<Option<Uuid>>,
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date,
                               project_id, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assigned_to, created_by, version, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.unwrap_or_default())
        .bind(data.priority.unwrap_or_default())
        .bind(data.due_date)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assigned_to, created_by, version, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists every task, newest first (admin view)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assigned_to, created_by, version, created_at
            FROM tasks
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks a user created or is assigned to, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assigned_to, created_by, version, created_at
            FROM tasks
            WHERE assigned_to = $1 OR created_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks of one project, newest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assigned_to, created_by, version, created_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// Only non-None fields in `data` are written; `version` increments on
    /// every write. With `expected_version` the write becomes a
    /// compare-and-swap, as for projects.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
        expected_version: Option<i32>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut clauses: Vec<String> = vec!["version = version + 1".to_string()];
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            clauses.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            clauses.push(format!("status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            clauses.push(format!("priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            clauses.push(format!("due_date = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            clauses.push(format!("assigned_to = ${}", bind_count));
        }

        let mut query = format!("UPDATE tasks SET {} WHERE id = $1", clauses.join(", "));
        if expected_version.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND version = ${}", bind_count));
        }
        query.push_str(
            " RETURNING id, title, description, status, priority, due_date, \
             project_id, assigned_to, created_by, version, created_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(version) = expected_version {
            q = q.bind(version);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Partial view of a project embedded in task responses
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectRef {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,
}

impl ProjectRef {
    /// Loads the name refs for a set of project ids in one query
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let refs = sqlx::query_as::<_, ProjectRef>(
            r#"
            SELECT id, name
            FROM projects
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await?;

        Ok(refs)
    }
}

/// Fully populated task view returned by the API
///
/// The project reference is optional because a task can outlive its project.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    /// Task ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Due date
    pub due_date: NaiveDate,

    /// Parent project, resolved to a name ref (None if the project is gone)
    pub project: Option<ProjectRef>,

    /// Assignee, resolved to a partial user view
    pub assigned_to: Option<UserSummary>,

    /// Creator, resolved to a partial user view
    pub created_by: UserSummary,

    /// Optimistic concurrency version
    pub version: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TaskDetail {
    fn assemble(
        task: Task,
        project: Option<ProjectRef>,
        assigned_to: Option<UserSummary>,
        created_by: UserSummary,
    ) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            project,
            assigned_to,
            created_by,
            version: task.version,
            created_at: task.created_at,
        }
    }

    /// Populates a single task
    pub async fn load(pool: &PgPool, task: Task) -> Result<Self, sqlx::Error> {
        let project = ProjectRef::find_by_ids(pool, &[task.project_id])
            .await?
            .into_iter()
            .next();

        let assigned_to = match task.assigned_to {
            Some(user_id) => UserSummary::find_by_id(pool, user_id).await?,
            None => None,
        };

        let created_by = UserSummary::find_by_id(pool, task.created_by)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(Self::assemble(task, project, assigned_to, created_by))
    }

    /// Populates a batch of tasks with two lookup queries total
    pub async fn load_many(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<Self>, sqlx::Error> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<Uuid> = Vec::new();
        let mut project_ids: Vec<Uuid> = Vec::new();
        for task in &tasks {
            user_ids.push(task.created_by);
            if let Some(assignee) = task.assigned_to {
                user_ids.push(assignee);
            }
            project_ids.push(task.project_id);
        }
        user_ids.sort_unstable();
        user_ids.dedup();
        project_ids.sort_unstable();
        project_ids.dedup();

        let users: HashMap<Uuid, UserSummary> = UserSummary::find_by_ids(pool, &user_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let projects: HashMap<Uuid, ProjectRef> = ProjectRef::find_by_ids(pool, &project_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut details = Vec::with_capacity(tasks.len());
        for task in tasks {
            let project = projects.get(&task.project_id).cloned();
            let assigned_to = task.assigned_to.and_then(|id| users.get(&id).cloned());
            let created_by = users
                .get(&task.created_by)
                .cloned()
                .ok_or(sqlx::Error::RowNotFound)?;
            details.push(Self::assemble(task, project, assigned_to, created_by));
        }

        Ok(details)
    }
}
