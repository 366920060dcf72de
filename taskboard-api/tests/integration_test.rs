/// Integration tests for the Taskboard API
///
/// These tests verify the full system works end-to-end:
/// - Registration and login
/// - Role-gated project creation
/// - Membership-scoped project access and listing
/// - Task authorization across creator, assignee, owner, member, stranger
/// - Tasks surviving project deletion
/// - Optimistic concurrency on updates

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskboard_shared::models::membership::ProjectMember;
use taskboard_shared::models::user::UserRole;

// ---- Authentication ----

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("register-{}@example.com", uuid::Uuid::new_v4());
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Jean Dupont",
                "email": email,
                "password": "motdepasse1"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());

    // Wrong password is rejected with the same message as unknown email
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "mauvaispass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid credentials");

    // Correct credentials succeed
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "motdepasse1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The token works against /me
    let (status, body) = ctx.request("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email);
    assert!(body["data"].get("password_hash").is_none());

    // Manual cleanup for the registered user
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let (user, _) = ctx.create_user(UserRole::User).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Copycat",
                "email": user.email,
                "password": "motdepasse1"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate field value entered");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request("GET", "/api/projects", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let (user, token) = ctx.create_user(UserRole::User).await.unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, _) = ctx.request("GET", "/api/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

// ---- Projects ----

#[tokio::test]
async fn test_plain_user_cannot_create_project() {
    let ctx = TestContext::new().await.unwrap();
    let (_, token) = ctx.create_user(UserRole::User).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({
                "name": "Interdit",
                "description": "Ne doit pas exister",
                "deadline": "2026-12-31"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to create projects");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_responsable_creates_project_with_defaults() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, token) = ctx.create_user(UserRole::Responsable).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({
                "name": "Refonte du site",
                "description": "Nouveau site vitrine",
                "deadline": "2026-12-31"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    let data = &body["data"];
    assert_eq!(data["progress"], 0);
    assert_eq!(data["image"], "no-image.jpg");
    assert_eq!(data["status"], "En cours");
    assert_eq!(data["version"], 1);

    // The owner is populated, not returned as a raw id
    assert_eq!(data["owner"]["id"], owner.id.to_string());
    assert_eq!(data["owner"]["email"], owner.email);
    assert!(data.get("owner_id").is_none());
    assert!(data["owner"].get("password_hash").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_unknown_payload_field_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let (_, token) = ctx.create_user(UserRole::Responsable).await.unwrap();

    // owner_id is not in the allow-list and must not be assignable
    let (status, _) = ctx
        .request(
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({
                "name": "Sournois",
                "description": "Tentative de forcer le propriétaire",
                "deadline": "2026-12-31",
                "owner_id": uuid::Uuid::new_v4()
            })),
        )
        .await;

    assert!(status.is_client_error());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_project_access_is_membership_scoped() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (member, member_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, stranger_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, admin_token) = ctx.create_user(UserRole::Admin).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    ProjectMember::add(&ctx.db, project.id, member.id)
        .await
        .unwrap();

    let uri = format!("/api/projects/{}", project.id);

    // Owner, member, and admin can read
    for token in [&owner_token, &member_token, &admin_token] {
        let (status, _) = ctx.request("GET", &uri, Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    // A stranger gets the French denial
    let (status, body) = ctx.request("GET", &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Pas autorisé à accéder à ce projet");

    // A member may read but not modify
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&member_token),
            Some(json!({ "progress": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Pas autorisé à modifier ce projet");

    // Nor delete
    let (status, body) = ctx.request("DELETE", &uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to delete this project");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_project_listing_is_scoped() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, _) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (other_owner, _) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (member, member_token) = ctx.create_user(UserRole::User).await.unwrap();

    let visible = common::create_test_project(&ctx, owner.id).await.unwrap();
    let hidden = common::create_test_project(&ctx, other_owner.id)
        .await
        .unwrap();
    ProjectMember::add(&ctx.db, visible.id, member.id)
        .await
        .unwrap();

    let (status, body) = ctx
        .request("GET", "/api/projects", Some(&member_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&visible.id.to_string()));
    assert!(!ids.contains(&hidden.id.to_string()));
    assert_eq!(body["count"], ids.len());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_add_member_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (member, member_token) = ctx.create_user(UserRole::User).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    let uri = format!("/api/projects/{}/members", project.id);

    // Missing user id
    let (status, body) = ctx
        .request("PUT", &uri, Some(&owner_token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a user ID");

    // Unknown user
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "user_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    // First add succeeds and returns the populated member list
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "user_id": member.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "add member failed: {}", body);
    let members = body["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["id"], member.id.to_string());

    // Second add of the same user is rejected
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "user_id": member.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User is already a member of this project");

    // Members themselves may not manage the list
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&member_token),
            Some(json!({ "user_id": owner.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to add members to this project");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_project_update_version_conflict() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, token) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    let uri = format!("/api/projects/{}", project.id);

    // A versioned update against the current version succeeds
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "progress": 25, "version": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", body);
    assert_eq!(body["data"]["version"], 2);

    // Replaying the same expected version now conflicts
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "progress": 50, "version": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    // An unversioned update is last-write-wins and still works
    let (status, body) = ctx
        .request("PUT", &uri, Some(&token), Some(json!({ "progress": 75 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], 75);
    assert_eq!(body["data"]["version"], 3);

    ctx.cleanup().await.unwrap();
}

// ---- Tasks ----

#[tokio::test]
async fn test_task_creation_requires_project_standing() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, _) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (member, member_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, stranger_token) = ctx.create_user(UserRole::User).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    ProjectMember::add(&ctx.db, project.id, member.id)
        .await
        .unwrap();

    let uri = format!("/api/projects/{}/tasks", project.id);
    let payload = json!({
        "title": "Maquettes",
        "due_date": "2026-06-30"
    });

    // A member can create; creator and defaults come from the server side
    let (status, body) = ctx
        .request("POST", &uri, Some(&member_token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    assert_eq!(body["data"]["status"], "En cours");
    assert_eq!(body["data"]["priority"], "Moyenne");
    assert_eq!(body["data"]["created_by"]["id"], member.id.to_string());
    assert_eq!(body["data"]["project"]["id"], project.id.to_string());

    // A stranger cannot
    let (status, body) = ctx
        .request("POST", &uri, Some(&stranger_token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to add tasks to this project");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_read_and_modify_matrix() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (creator, creator_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (assignee, assignee_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (member, member_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, stranger_token) = ctx.create_user(UserRole::User).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    for user_id in [creator.id, assignee.id, member.id] {
        ProjectMember::add(&ctx.db, project.id, user_id)
            .await
            .unwrap();
    }

    let task = common::create_test_task(&ctx, project.id, creator.id, Some(assignee.id))
        .await
        .unwrap();
    let uri = format!("/api/tasks/{}", task.id);

    // Everyone with standing can read
    for token in [&owner_token, &creator_token, &assignee_token, &member_token] {
        let (status, _) = ctx.request("GET", &uri, Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    // A stranger cannot
    let (status, body) = ctx.request("GET", &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to access this task");

    // A plain member who is neither creator nor owner cannot modify
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&member_token),
            Some(json!({ "status": "Terminé" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to update this task");

    let (status, body) = ctx.request("DELETE", &uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to delete this task");

    // The project owner can modify
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "status": "Terminé" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "owner update failed: {}", body);
    assert_eq!(body["data"]["status"], "Terminé");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_update_revalidates_description_length() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    let task = common::create_test_task(&ctx, project.id, owner.id, None)
        .await
        .unwrap();
    let uri = format!("/api/tasks/{}", task.id);

    // An oversized description is rejected on update just like on create
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "description": "x".repeat(501) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Description cannot exceed 500 characters");

    // A description at the limit still goes through
    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "description": "x".repeat(500) })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", body);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_invalid_reference_does_not_leak_constraint_name() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let project = common::create_test_project(&ctx, owner.id).await.unwrap();

    // Assigning a nonexistent user trips a foreign key; the client gets a
    // neutral 400, not the index name
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/api/projects/{}/tasks", project.id),
            Some(&owner_token),
            Some(json!({
                "title": "Fantôme",
                "due_date": "2026-06-30",
                "assigned_to": uuid::Uuid::new_v4()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid field value entered");
    assert!(!body.to_string().contains("fkey"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_survives_project_deletion() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, owner_token) = ctx.create_user(UserRole::Responsable).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    let task = common::create_test_task(&ctx, project.id, owner.id, None)
        .await
        .unwrap();

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/projects/{}", project.id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The task remains readable by its creator, with a null project ref
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/api/tasks/{}", task.id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "orphan read failed: {}", body);
    assert!(body["data"]["project"].is_null());

    // And the creator can still update and delete it
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/tasks/{}", task.id),
            Some(&owner_token),
            Some(json!({ "status": "En retard" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_project_task_listing_checks_existence_only() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, _) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (_, outsider_token) = ctx.create_user(UserRole::User).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    common::create_test_task(&ctx, project.id, owner.id, None)
        .await
        .unwrap();

    // Any authenticated caller can list a project's tasks by id
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/api/projects/{}/tasks", project.id),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    // But a missing project is still a 404
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/api/projects/{}/tasks", uuid::Uuid::new_v4()),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_listing_is_scoped_to_creator_and_assignee() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, _) = ctx.create_user(UserRole::Responsable).await.unwrap();
    let (assignee, assignee_token) = ctx.create_user(UserRole::User).await.unwrap();

    let project = common::create_test_project(&ctx, owner.id).await.unwrap();
    let mine = common::create_test_task(&ctx, project.id, owner.id, Some(assignee.id))
        .await
        .unwrap();
    let not_mine = common::create_test_task(&ctx, project.id, owner.id, None)
        .await
        .unwrap();

    let (status, body) = ctx
        .request("GET", "/api/tasks", Some(&assignee_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&mine.id.to_string()));
    assert!(!ids.contains(&not_mine.id.to_string()));

    ctx.cleanup().await.unwrap();
}

// ---- User administration ----

#[tokio::test]
async fn test_user_directory_is_admin_only() {
    let ctx = TestContext::new().await.unwrap();
    let (_, user_token) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, admin_token) = ctx.create_user(UserRole::Admin).await.unwrap();

    let (status, body) = ctx.request("GET", "/api/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "User role user is not authorized to access this route"
    );

    let (status, body) = ctx
        .request("GET", "/api/users", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_u64().unwrap() >= 2);
    // No password material anywhere in the listing
    assert!(!body.to_string().contains("password_hash"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_admin_can_change_roles() {
    let ctx = TestContext::new().await.unwrap();
    let (user, _) = ctx.create_user(UserRole::User).await.unwrap();
    let (_, admin_token) = ctx.create_user(UserRole::Admin).await.unwrap();

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/users/{}", user.id),
            Some(&admin_token),
            Some(json!({ "role": "responsable" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "role change failed: {}", body);
    assert_eq!(body["data"]["role"], "responsable");

    ctx.cleanup().await.unwrap();
}
