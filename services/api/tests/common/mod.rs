#![allow(dead_code)]

use std::sync::Arc;

use api_lib::{
    adapters::MemoryAdapter,
    config::Config,
    web::{build_router, AppState, TabRegistry},
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use coursebuilder_core::course::CourseOutline;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Two top-level units, one with an embedded quiz unit.
pub fn sample_outline() -> CourseOutline {
    serde_json::from_value(json!({
        "units": [
            {
                "id": "u1",
                "title": "Getting Started",
                "labels": ["core"],
                "lessons": [
                    { "id": "l1", "title": "Welcome", "has_activity": true },
                    { "id": "l2", "title": "Setup" }
                ]
            },
            { "id": "u1-quiz", "title": "Unit 1 Quiz", "parent_unit": "u1" },
            {
                "id": "u2",
                "title": "Going Further",
                "lessons": [ { "id": "l1", "title": "Next Steps" } ]
            }
        ]
    }))
    .expect("valid outline")
}

pub fn app_with(outline: CourseOutline, config: Config) -> Router {
    let storage = Arc::new(MemoryAdapter::new(outline));
    let tabs = TabRegistry::teacher_dashboard().expect("tab registry");
    build_router(Arc::new(AppState::with_storage(
        storage,
        Arc::new(config),
        tabs,
    )))
}

pub fn app() -> Router {
    app_with(
        sample_outline(),
        Config {
            admin_emails: vec![ADMIN_EMAIL.to_string()],
            ..Config::default()
        },
    )
}

/// Sends one request as `user_id`/`email` (anonymous when `None`).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<(&str, &str)>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, email)) = user {
        builder = builder
            .header("x-user-id", user_id)
            .header("x-user-email", email);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub async fn register(app: &Router, user_id: &str, email: &str, name: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/register",
        Some((user_id, email)),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
