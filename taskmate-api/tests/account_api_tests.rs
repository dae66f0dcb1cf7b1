/// HTTP tests for registration, login and the account endpoints

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/v1/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new();
    let user = ctx.register("ada").await;

    let (status, body) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert!(body["access_token"].is_string());

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("ada").await;

    let (wrong_password, body_a) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": "Wrong-password1" }),
        )
        .await;
    let (unknown_login, body_b) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "nobody", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_login, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let ctx = TestContext::new();
    ctx.register("ada").await;

    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "username": "ada",
                "email": "other@example.com",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "username": "grace",
                "email": "ADA@example.com",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "username": "grace",
                "email": "grace@example.com",
                "password": "weak",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(ctx.store.row_counts().await.users, 1);
}

#[tokio::test]
async fn test_malformed_body_is_unprocessable() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post("/v1/auth/register", None, json!({ "username": "ada" }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].is_array());
}

#[tokio::test]
async fn test_missing_content_type_is_unprocessable() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/login")
                .body(Body::from(r#"{"login":"ada","password":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_account_requires_a_valid_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/v1/account", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/v1/account", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/account")
                .header(header::AUTHORIZATION, "Basic YWRhOnB3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_and_edit_account() {
    let ctx = TestContext::new();
    let user = ctx.register("ada").await;

    let (status, body) = ctx.get("/v1/account", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert!(body["date_modified"].is_null());
    assert!(body.get("password_hash").is_none());

    let (status, body) = ctx
        .put(
            "/v1/account",
            Some(&user.token),
            json!({ "first_name": "Augusta", "last_name": "", "email": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Augusta");
    assert_eq!(body["last_name"], "User");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["date_modified"].is_string());
}

#[tokio::test]
async fn test_edit_account_cannot_take_another_username() {
    let ctx = TestContext::new();
    let ada = ctx.register("ada").await;
    ctx.register("grace").await;

    let (status, _) = ctx
        .put("/v1/account", Some(&ada.token), json!({ "username": "grace" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = ctx.get("/v1/account", Some(&ada.token)).await;
    assert_eq!(body["username"], "ada");
}

#[tokio::test]
async fn test_change_password() {
    let ctx = TestContext::new();
    let user = ctx.register("ada").await;

    let (status, _) = ctx
        .put(
            "/v1/account/password",
            Some(&user.token),
            json!({
                "old_password": PASSWORD,
                "new_password": "Difference2",
                "confirm_new_password": "Difference2",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": "Difference2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_rejections() {
    let ctx = TestContext::new();
    let user = ctx.register("ada").await;

    let cases = [
        json!({ "new_password": "Difference2", "confirm_new_password": "Difference2" }),
        json!({
            "old_password": "Wrong-password1",
            "new_password": "Difference2",
            "confirm_new_password": "Difference2",
        }),
        json!({
            "old_password": PASSWORD,
            "new_password": PASSWORD,
            "confirm_new_password": PASSWORD,
        }),
        json!({
            "old_password": PASSWORD,
            "new_password": "Difference2",
            "confirm_new_password": "Difference3",
        }),
        json!({
            "old_password": PASSWORD,
            "new_password": "weak",
            "confirm_new_password": "weak",
        }),
    ];

    for case in cases {
        let (status, body) = ctx
            .put("/v1/account/password", Some(&user.token), case.clone())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}: {}", case, body);
    }

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_account_removes_everything_it_owns() {
    let ctx = TestContext::new();
    let ada = ctx.register("ada").await;
    let grace = ctx.register("grace").await;

    let task = ctx.create_task(&ada, "Engine notes").await;
    ctx.create_subtask(&ada, &task, "Bernoulli numbers").await;
    ctx.create_task(&ada, "Letters").await;
    ctx.create_task(&grace, "Compiler").await;

    let (status, report) = ctx.delete("/v1/account", Some(&ada.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["users"], 1);
    assert_eq!(report["credentials"], 1);
    assert_eq!(report["tasks"], 2);
    assert_eq!(report["subtasks"], 1);

    let counts = ctx.store.row_counts().await;
    assert_eq!(counts.users, 1);
    assert_eq!(counts.credentials, 1);
    assert_eq!(counts.tasks, 1);
    assert_eq!(counts.subtasks, 0);

    let (status, _) = ctx.get("/v1/account", Some(&ada.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "login": "ada", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.get("/v1/tasks", Some(&grace.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
