/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation with roles
/// - JWT token generation
/// - Request helpers returning status + parsed body

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use std::sync::Mutex;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
use taskboard_shared::auth::password::hash_password;
use taskboard_shared::models::project::{CreateProject, Project};
use taskboard_shared::models::task::{CreateTask, Task};
use taskboard_shared::models::user::{CreateUser, User, UserRole};
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    created_users: Mutex<Vec<Uuid>>,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            created_users: Mutex::new(Vec::new()),
        })
    }

    /// Creates a user with the given role and returns it with an access token
    pub async fn create_user(&self, role: UserRole) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: format!("Test {}", role.as_str()),
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: hash_password("motdepasse1")?,
                role,
            },
        )
        .await?;

        self.created_users.lock().unwrap().push(user.id);

        let claims = Claims::new(user.id, user.role, TokenType::Access);
        let token = create_token(&claims, &self.config.jwt.secret)?;

        Ok((user, token))
    }

    /// Sends a request and returns the status plus the parsed JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Deletes everything the context's users created, in dependency order
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let user_ids = self.created_users.lock().unwrap().clone();

        sqlx::query("DELETE FROM tasks WHERE created_by = ANY($1)")
            .bind(&user_ids)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM projects WHERE owner_id = ANY($1)")
            .bind(&user_ids)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// Creates a project owned by the given user, directly in the database
pub async fn create_test_project(ctx: &TestContext, owner_id: Uuid) -> anyhow::Result<Project> {
    let project = Project::create(
        &ctx.db,
        CreateProject {
            name: format!("Projet {}", Uuid::new_v4()),
            description: "Projet de test".to_string(),
            deadline: chrono::NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            progress: None,
            image: None,
            status: None,
            owner_id,
        },
    )
    .await?;

    Ok(project)
}

/// Creates a task in the given project, directly in the database
pub async fn create_test_task(
    ctx: &TestContext,
    project_id: Uuid,
    created_by: Uuid,
    assigned_to: Option<Uuid>,
) -> anyhow::Result<Task> {
    let task = Task::create(
        &ctx.db,
        CreateTask {
            title: format!("Tâche {}", Uuid::new_v4()),
            description: None,
            status: None,
            priority: None,
            due_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            project_id,
            assigned_to,
            created_by,
        },
    )
    .await?;

    Ok(task)
}
