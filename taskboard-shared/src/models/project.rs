/// Project model, database operations, and populated views
///
/// A project is owned by the user who created it and carries a list of
/// members granted access. Status labels are the French ones used throughout
/// the product.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('En cours', 'Terminé', 'En retard', 'À revoir');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     deadline DATE NOT NULL,
///     progress INT NOT NULL DEFAULT 0 CHECK (progress >= 0 AND progress <= 100),
///     image VARCHAR(255) NOT NULL DEFAULT 'no-image.jpg',
///     status project_status NOT NULL DEFAULT 'En cours',
///     owner_id UUID NOT NULL REFERENCES users(id),
///     version INT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The `version` column backs the optional compare-and-swap update path;
/// every successful update increments it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::membership::{ProjectMember, ProjectMemberRow};
use super::user::UserSummary;
use crate::auth::policy::ProjectAccess;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status")]
pub enum ProjectStatus {
    /// Work in progress (default)
    #[sqlx(rename = "En cours")]
    #[serde(rename = "En cours")]
    EnCours,

    /// Finished
    #[sqlx(rename = "Terminé")]
    #[serde(rename = "Terminé")]
    Termine,

    /// Past its deadline
    #[sqlx(rename = "En retard")]
    #[serde(rename = "En retard")]
    EnRetard,

    /// Needs review
    #[sqlx(rename = "À revoir")]
    #[serde(rename = "À revoir")]
    ARevoir,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::EnCours
    }
}

/// Project model as stored in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name (max 100 chars)
    pub name: String,

    /// Description (max 500 chars)
    pub description: String,

    /// Delivery deadline
    pub deadline: NaiveDate,

    /// Completion percentage, 0 to 100
    pub progress: i32,

    /// Image reference shown in the UI
    pub image: String,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Owner user ID, set at creation and never reassigned
    pub owner_id: Uuid,

    /// Optimistic concurrency version, bumped on every update
    pub version: i32,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
///
/// The owner id always comes from the authenticated actor, never from the
/// request payload.
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Description
    pub description: String,

    /// Delivery deadline
    pub deadline: NaiveDate,

    /// Initial progress (defaults to 0)
    pub progress: Option<i32>,

    /// Image reference (defaults to the placeholder)
    pub image: Option<String>,

    /// Initial status (defaults to "En cours")
    pub status: Option<ProjectStatus>,

    /// Owner, injected from the actor
    pub owner_id: Uuid,
}

/// Input for updating an existing project
///
/// Only non-None fields are written. Ownership is not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New deadline
    pub deadline: Option<NaiveDate>,

    /// New progress value
    pub progress: Option<i32>,

    /// New image reference
    pub image: Option<String>,

    /// New status
    pub status: Option<ProjectStatus>,
}

impl Project {
    /// Creates a new project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, deadline, progress, image, status, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, deadline, progress, image, status,
                      owner_id, version, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.progress.unwrap_or(0))
        .bind(data.image.unwrap_or_else(|| "no-image.jpg".to_string()))
        .bind(data.status.unwrap_or_default())
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, deadline, progress, image, status,
                   owner_id, version, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists every project, newest first (admin view)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, deadline, progress, image, status,
                   owner_id, version, created_at
            FROM projects
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Lists the projects a user owns or is a member of, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT DISTINCT p.id, p.name, p.description, p.deadline, p.progress,
                   p.image, p.status, p.owner_id, p.version, p.created_at
            FROM projects p
            LEFT JOIN project_members m ON m.project_id = p.id
            WHERE p.owner_id = $1 OR m.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates a project
    ///
    /// Only non-None fields in `data` are written; `version` increments on
    /// every write. When `expected_version` is given the write is a
    /// compare-and-swap: None is returned if the row exists but the version
    /// moved on (or the row is gone — callers that already loaded the
    /// project can tell the two apart).
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
        expected_version: Option<i32>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut clauses: Vec<String> = vec!["version = version + 1".to_string()];
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            clauses.push(format!("name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }
        if data.deadline.is_some() {
            bind_count += 1;
            clauses.push(format!("deadline = ${}", bind_count));
        }
        if data.progress.is_some() {
            bind_count += 1;
            clauses.push(format!("progress = ${}", bind_count));
        }
        if data.image.is_some() {
            bind_count += 1;
            clauses.push(format!("image = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            clauses.push(format!("status = ${}", bind_count));
        }

        let mut query = format!(
            "UPDATE projects SET {} WHERE id = $1",
            clauses.join(", ")
        );
        if expected_version.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND version = ${}", bind_count));
        }
        query.push_str(
            " RETURNING id, name, description, deadline, progress, image, status, \
             owner_id, version, created_at",
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(deadline) = data.deadline {
            q = q.bind(deadline);
        }
        if let Some(progress) = data.progress {
            q = q.bind(progress);
        }
        if let Some(image) = data.image {
            q = q.bind(image);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(version) = expected_version {
            q = q.bind(version);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes a project by ID
    ///
    /// Membership rows cascade; tasks pointing at the project are left in
    /// place on purpose.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Builds the access snapshot the authorization policy evaluates
    pub async fn access(&self, pool: &PgPool) -> Result<ProjectAccess, sqlx::Error> {
        let member_ids = ProjectMember::member_ids(pool, self.id).await?;

        Ok(ProjectAccess {
            owner_id: self.owner_id,
            member_ids,
        })
    }
}

/// Fully populated project view returned by the API
///
/// Owner and members are resolved to partial user views; the raw owner id
/// never leaves the server unpopulated.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Description
    pub description: String,

    /// Delivery deadline
    pub deadline: NaiveDate,

    /// Completion percentage
    pub progress: i32,

    /// Image reference
    pub image: String,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Owner, resolved to a partial user view
    pub owner: UserSummary,

    /// Members, resolved to partial user views
    pub members: Vec<UserSummary>,

    /// Optimistic concurrency version
    pub version: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ProjectDetail {
    fn assemble(project: Project, owner: UserSummary, members: Vec<UserSummary>) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            deadline: project.deadline,
            progress: project.progress,
            image: project.image,
            status: project.status,
            owner,
            members,
            version: project.version,
            created_at: project.created_at,
        }
    }

    /// Populates a single project
    ///
    /// # Errors
    ///
    /// Returns `RowNotFound` if the owner row is missing, which would mean
    /// a broken foreign key.
    pub async fn load(pool: &PgPool, project: Project) -> Result<Self, sqlx::Error> {
        let owner = UserSummary::find_by_id(pool, project.owner_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let members = ProjectMember::member_summaries(pool, project.id).await?;

        Ok(Self::assemble(project, owner, members))
    }

    /// Populates a batch of projects with three queries total
    ///
    /// Owner summaries and member lists are fetched in bulk and stitched in
    /// memory, so list endpoints stay flat regardless of result size.
    pub async fn load_many(
        pool: &PgPool,
        projects: Vec<Project>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if projects.is_empty() {
            return Ok(Vec::new());
        }

        let owner_ids: Vec<Uuid> = projects.iter().map(|p| p.owner_id).collect();
        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

        let owners: HashMap<Uuid, UserSummary> = UserSummary::find_by_ids(pool, &owner_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut members_by_project: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
        for row in ProjectMemberRow::for_projects(pool, &project_ids).await? {
            let (project_id, summary) = row.into_summary();
            members_by_project.entry(project_id).or_default().push(summary);
        }

        let mut details = Vec::with_capacity(projects.len());
        for project in projects {
            let owner = owners
                .get(&project.owner_id)
                .cloned()
                .ok_or(sqlx::Error::RowNotFound)?;
            let members = members_by_project.remove(&project.id).unwrap_or_default();
            details.push(Self::assemble(project, owner, members));
        }

        Ok(details)
    }
}
