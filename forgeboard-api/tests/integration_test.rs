/// Integration tests for the Forgeboard API
///
/// These tests verify the full system works end-to-end:
/// - Signup and login, including the approval gate
/// - Invite-code redemption
/// - Project and task lifecycle with authorization
/// - Notifications staying owner-scoped
/// - Public contact intake
///
/// They need a running PostgreSQL database (DATABASE_URL), so they are
/// ignored by default. Run with: cargo test -- --ignored

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use forgeboard_shared::auth::reset::generate_reset_token;
use forgeboard_shared::models::notification::Notification;
use forgeboard_shared::models::password_reset::PasswordReset;
use forgeboard_shared::models::project::{CreateProject, Project};
use forgeboard_shared::models::task::{CreateTask, Task, TaskPriority};
use forgeboard_shared::models::user::{User, UserRole};
use serde_json::json;
use tower::Service as _;

fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Client signup is self-service and immediately yields a session token
#[tokio::test]
#[ignore]
async fn test_client_signup_and_login() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("it-{}@example.com", uuid::Uuid::new_v4());
    let request = post_json(
        "/v1/auth/signup",
        None,
        json!({
            "name": "Signup Test",
            "email": email,
            "password": common::TEST_PASSWORD,
        }),
    );

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());

    // And the same credentials log in
    let request = post_json(
        "/v1/auth/login",
        None,
        json!({ "email": email, "password": common::TEST_PASSWORD }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["user"]["role"], "client");

    ctx.cleanup().await.unwrap();
}

/// Developer signup needs an invite; without one it is rejected
#[tokio::test]
#[ignore]
async fn test_developer_signup_requires_invite() {
    let ctx = TestContext::new().await.unwrap();

    let request = post_json(
        "/v1/auth/signup",
        None,
        json!({
            "name": "No Invite",
            "email": format!("it-{}@example.com", uuid::Uuid::new_v4()),
            "password": common::TEST_PASSWORD,
            "role": "developer",
        }),
    );

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Invite flow: admin mints a code, developer redeems it, sits pending
/// until approved, then can log in
#[tokio::test]
#[ignore]
async fn test_invite_redemption_and_approval_gate() {
    let ctx = TestContext::new().await.unwrap();

    let request = post_json(
        "/v1/admin/invites",
        Some(&ctx.admin_token),
        json!({ "role": "developer" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let code = body["data"]["code"].as_str().unwrap().to_string();

    let email = format!("it-{}@example.com", uuid::Uuid::new_v4());
    let request = post_json(
        "/v1/auth/signup",
        None,
        json!({
            "name": "Invited Dev",
            "email": email,
            "password": common::TEST_PASSWORD,
            "role": "developer",
            "invite_code": code,
        }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    // Pending accounts get no session token
    assert!(body["data"]["token"].is_null());

    // Login is blocked while the account is pending
    let request = post_json(
        "/v1/auth/login",
        None,
        json!({ "email": email, "password": common::TEST_PASSWORD }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["needsApproval"], true);

    // Approve and retry
    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    let request = post_json(
        &format!("/v1/admin/users/{}/approve", user.id),
        Some(&ctx.admin_token),
        json!({}),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = post_json(
        "/v1/auth/login",
        None,
        json!({ "email": email, "password": common::TEST_PASSWORD }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

/// Requests without a session token are rejected
#[tokio::test]
#[ignore]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.app.clone().call(get("/v1/projects", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Project lifecycle: create, add a task, then deletion is blocked until
/// the task is gone
#[tokio::test]
#[ignore]
async fn test_project_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let client = common::create_user(&ctx.db, UserRole::Client).await.unwrap();
    let client_token = ctx.token_for(&client);

    let request = post_json(
        "/v1/projects",
        Some(&client_token),
        json!({ "name": "Website rebuild", "budget": 1500.0 }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let project_id = body["data"]["id"].as_str().unwrap().to_string();

    // The admin can create a task in it
    let request = post_json(
        "/v1/tasks",
        Some(&ctx.admin_token),
        json!({ "project_id": project_id, "title": "Set up CI" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let task_id = body["data"]["id"].as_str().unwrap().to_string();

    // Deletion is refused while the task exists
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/projects/{}", project_id))
        .header("authorization", format!("Bearer {}", client_token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Remove the task, then deletion goes through
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/projects/{}", project_id))
        .header("authorization", format!("Bearer {}", client_token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

/// One client cannot read another client's project
#[tokio::test]
#[ignore]
async fn test_project_visibility_is_scoped() {
    let ctx = TestContext::new().await.unwrap();

    let owner = common::create_user(&ctx.db, UserRole::Client).await.unwrap();
    let stranger = common::create_user(&ctx.db, UserRole::Client).await.unwrap();

    let request = post_json(
        "/v1/projects",
        Some(&ctx.token_for(&owner)),
        json!({ "name": "Private project" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = common::body_json(response).await;
    let project_id = body["data"]["id"].as_str().unwrap().to_string();

    let request = get(
        &format!("/v1/projects/{}", project_id),
        Some(&ctx.token_for(&stranger)),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// Assignment notifies the assignee, and notifications stay owner-scoped
#[tokio::test]
#[ignore]
async fn test_assignment_notification_owner_scoped() {
    let ctx = TestContext::new().await.unwrap();

    let client = common::create_user(&ctx.db, UserRole::Client).await.unwrap();
    let dev = common::create_user(&ctx.db, UserRole::Developer).await.unwrap();

    let request = post_json(
        "/v1/projects",
        Some(&ctx.token_for(&client)),
        json!({ "name": "Notify test" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = common::body_json(response).await;
    let project_id = body["data"]["id"].as_str().unwrap().to_string();

    let request = post_json(
        &format!("/v1/projects/{}/members", project_id),
        Some(&ctx.admin_token),
        json!({ "user_id": dev.id }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = post_json(
        "/v1/tasks",
        Some(&ctx.admin_token),
        json!({ "project_id": project_id, "title": "Wire the modal" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = common::body_json(response).await;
    let task_id = body["data"]["id"].as_str().unwrap().to_string();

    let request = post_json(
        &format!("/v1/tasks/{}/assign", task_id),
        Some(&ctx.admin_token),
        json!({ "assignee_id": dev.id }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Membership add + assignment both notified the developer
    let unread = Notification::unread_count(&ctx.db, dev.id).await.unwrap();
    assert!(unread >= 2, "expected at least 2 notifications, got {}", unread);

    // The client sees none of them
    let request = get("/v1/notifications/unread-count", Some(&ctx.token_for(&client)));
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["unread"], 0);

    ctx.cleanup().await.unwrap();
}

/// Contact intake works without a session and lands in the admin queue
#[tokio::test]
#[ignore]
async fn test_contact_intake_public() {
    let ctx = TestContext::new().await.unwrap();

    let request = post_json(
        "/v1/contact",
        None,
        json!({
            "name": "Prospect",
            "email": format!("it-{}@example.com", uuid::Uuid::new_v4()),
            "subject": "Quote request",
            "body": "How much for a storefront?",
        }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Admin review list contains it; non-admins are turned away
    let request = get("/v1/contact", Some(&ctx.admin_token));
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let client = common::create_user(&ctx.db, UserRole::Client).await.unwrap();
    let request = get("/v1/contact", Some(&ctx.token_for(&client)));
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// A reset token works exactly once; replaying it is rejected
#[tokio::test]
#[ignore]
async fn test_reset_token_is_single_use() {
    let ctx = TestContext::new().await.unwrap();

    let user = common::create_user(&ctx.db, UserRole::Client).await.unwrap();

    // Seed a token at the model layer, the same way forgot-password does
    let (token, token_hash) = generate_reset_token();
    PasswordReset::create(&ctx.db, user.id, &token_hash, chrono::Duration::minutes(30))
        .await
        .unwrap();

    let new_password = "Fr3sh-passw0rd!";
    let request = post_json(
        "/v1/auth/reset-password",
        None,
        json!({ "token": token, "password": new_password }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The new password logs in
    let request = post_json(
        "/v1/auth/login",
        None,
        json!({ "email": user.email, "password": new_password }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Replaying the same token is refused
    let request = post_json(
        "/v1/auth/reset-password",
        None,
        json!({ "token": token, "password": "An0ther-passw0rd!" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// An invite code is consumed by its first redemption
#[tokio::test]
#[ignore]
async fn test_invite_code_single_redemption() {
    let ctx = TestContext::new().await.unwrap();

    let request = post_json(
        "/v1/admin/invites",
        Some(&ctx.admin_token),
        json!({ "role": "developer" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let code = body["data"]["code"].as_str().unwrap().to_string();

    let request = post_json(
        "/v1/auth/signup",
        None,
        json!({
            "name": "First Redeemer",
            "email": format!("it-{}@example.com", uuid::Uuid::new_v4()),
            "password": common::TEST_PASSWORD,
            "role": "developer",
            "invite_code": code,
        }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A second signup with the same code is a conflict
    let request = post_json(
        "/v1/auth/signup",
        None,
        json!({
            "name": "Second Redeemer",
            "email": format!("it-{}@example.com", uuid::Uuid::new_v4()),
            "password": common::TEST_PASSWORD,
            "role": "developer",
            "invite_code": code,
        }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
}

/// Deleting a user who still authored tasks is refused with a clean
/// message, not a raw constraint name
#[tokio::test]
#[ignore]
async fn test_delete_user_blocked_by_created_tasks() {
    let ctx = TestContext::new().await.unwrap();

    let dev = common::create_user(&ctx.db, UserRole::Developer).await.unwrap();

    let project = Project::create(
        &ctx.db,
        CreateProject {
            owner_id: ctx.admin.id,
            name: "Retention check".to_string(),
            description: None,
            budget: None,
        },
    )
    .await
    .unwrap();

    let task = Task::create(
        &ctx.db,
        CreateTask {
            project_id: project.id,
            title: "Authored by the developer".to_string(),
            description: None,
            priority: TaskPriority::Medium,
            created_by: dev.id,
            due_date: None,
        },
    )
    .await
    .unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/users/{}", dev.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = common::body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("task"), "unexpected message: {}", message);
    assert!(
        !message.contains("_fkey"),
        "constraint name leaked: {}",
        message
    );

    // Once the task is gone the deletion goes through
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/tasks/{}", task.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/users/{}", dev.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Drop the scaffold project so cleanup can remove its owner
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/projects/{}", project.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

/// Permission flags gate admin surfaces even for admin-adjacent roles
#[tokio::test]
#[ignore]
async fn test_permission_flags_gate_admin_routes() {
    let ctx = TestContext::new().await.unwrap();

    // A developer with no grants cannot list users
    let dev = common::create_user(&ctx.db, UserRole::Developer).await.unwrap();
    let request = get("/v1/admin/users", Some(&ctx.token_for(&dev)));
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The super admin always can
    let request = get("/v1/admin/users", Some(&ctx.admin_token));
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}
