/// Project membership association rows
///
/// Implements the many-to-many relationship between projects and the users
/// granted access to them. Membership conveys read/contribute rights; it never
/// conveys ownership, and the owner is not stored redundantly as a member.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// Duplicate additions are rejected by the member-add operation before the
/// primary key constraint ever fires, so callers get a clean 400 rather than
/// a database error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// A single project-member association
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// Member user ID
    pub user_id: Uuid,

    /// When the user was added to the project
    pub added_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// Returns an error if the pair already exists (primary key violation)
    /// or either side is missing (foreign key violation). Callers are
    /// expected to have checked both beforehand.
    pub async fn add(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            RETURNING project_id, user_id, added_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Checks whether a user is already a member of a project
    pub async fn exists(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Removes a user from a project
    pub async fn remove(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the member ids of a project, oldest first
    ///
    /// Used to build the access snapshot the authorization policy evaluates.
    pub async fn member_ids(pool: &PgPool, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM project_members
            WHERE project_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Resolves a project's members to their partial user views
    pub async fn member_summaries(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let members = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name, u.email
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.added_at
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

/// One member row of a batched membership lookup, tagged with its project
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectMemberRow {
    /// Project the member belongs to
    pub project_id: Uuid,

    /// Member user ID
    pub id: Uuid,

    /// Member display name
    pub name: String,

    /// Member email
    pub email: String,
}

impl ProjectMemberRow {
    /// Loads the member summaries for a set of projects in one query
    ///
    /// The population layer uses this to avoid per-project membership
    /// queries when shaping list responses.
    pub async fn for_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectMemberRow>(
            r#"
            SELECT m.project_id, u.id, u.name, u.email
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = ANY($1)
            ORDER BY m.added_at
            "#,
        )
        .bind(project_ids.to_vec())
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Splits off the embedded user summary
    pub fn into_summary(self) -> (Uuid, UserSummary) {
        (
            self.project_id,
            UserSummary {
                id: self.id,
                name: self.name,
                email: self.email,
            },
        )
    }
}
