//! Router harness for handler tests, backed by the in-memory store.

use crate::db::memory::MemoryStore;
use crate::middleware::RateLimiter;
use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_login_limit(100)
    }

    pub fn with_login_limit(max_attempts: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::with_store(
            store.clone(),
            RateLimiter::new(max_attempts, 60),
        ));
        Self { store, state }
    }

    pub fn router(&self) -> Router {
        super::routes(self.state.clone())
    }
}

/// Sends one request and decodes the body as JSON, or as a JSON string when it is plain text.
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .oneshot(builder.body(body).expect("Failed to build request"))
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// Signs a user up through the API and returns the stored id.
pub async fn signup_user(app: &TestApp, email: &str) -> i64 {
    use crate::db::UserStore;

    let body = serde_json::json!({
        "name": "Ravi",
        "email": email,
        "password": "pass1234",
        "age": 25,
        "gender": "male",
        "height_cm": 180,
        "weight_kg": 80
    });
    let (status, _) = send(app.router(), Method::POST, "/signup", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    app.store
        .find_user_by_email(email)
        .await
        .expect("store lookup")
        .expect("user exists")
        .user_id
}
