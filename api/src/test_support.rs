//! Router-level test helpers

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{create_router, seed::seed_demo_data, AppState};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Fresh state loaded with the demo users and projects
    pub async fn seeded() -> Self {
        let state = AppState::with_builtin_authz().unwrap();
        seed_demo_data(&state).await.unwrap();
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    /// Logs in through the API and returns the bearer token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = send(
            &self.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed for {}: {}", email, body);
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

pub async fn send(
    router: &Router,
    method: &str,
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

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
