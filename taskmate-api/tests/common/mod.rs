//! Common test utilities for the HTTP tests
//!
//! Every context runs the real router over a fresh in-memory store, so tests
//! need no database and can run in parallel.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskmate_api::app::{build_router, AppState};
use taskmate_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskmate_shared::store::memory::MemoryStore;
use tower::ServiceExt;

pub const PASSWORD: &str = "Analytical1";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            access_ttl_minutes: 60,
        },
    }
}

/// Router plus a handle on its store
pub struct TestContext {
    pub store: MemoryStore,
    pub app: Router,
}

/// A registered account
pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), test_config());

        Self {
            store,
            app: build_router(state),
        }
    }

    /// Sends one request; `token` becomes a bearer header
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Registers `username` with [`PASSWORD`]
    pub async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/v1/auth/register",
                None,
                json!({
                    "first_name": "Test",
                    "last_name": "User",
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, user: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post("/v1/tasks", Some(&user.token), json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a subtask and returns its id
    pub async fn create_subtask(&self, user: &TestUser, task_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/subtasks",
                Some(&user.token),
                json!({ "task_id": task_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create subtask failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}
