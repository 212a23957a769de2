mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::Harness;
use practice_timer::{create_router, tasks::lifecycle_observer_task};

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn full_session_over_http() {
    let h = Harness::new(Some(180));
    let app = create_router(Arc::clone(&h.state));

    let (status, body) = call(&app, "POST", "/timer/start", Some(json!({ "focus": "Scales" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "running");
    assert_eq!(body["timer"]["isRunning"], true);

    h.clock.advance_secs(75);
    let (status, body) = call(&app, "POST", "/timer/finish", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "stopped");
    assert_eq!(body["timer"]["display"], "01:15");

    let (status, body) = call(&app, "POST", "/timer/save", Some(json!({ "notes": "worked on scales" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "saved");
    assert_eq!(h.api.sessions().len(), 1);

    let (status, body) = call(&app, "GET", "/timer", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_action"], "save");
}

#[tokio::test]
async fn validation_errors_map_to_bad_request() {
    let h = Harness::new(None);
    let app = create_router(Arc::clone(&h.state));

    let (status, body) = call(&app, "POST", "/timer/start", Some(json!({ "focus": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "empty_focus");

    let (status, body) = call(&app, "POST", "/timer/start", Some(json!({ "focus": "Scales" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "goal_not_set");
    assert_eq!(body["status"], "error");

    let (status, body) = call(&app, "POST", "/timer/cancel", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "not_confirmed");
}

#[tokio::test]
async fn invalid_transition_is_a_conflict() {
    let h = Harness::new(Some(180));
    let app = create_router(Arc::clone(&h.state));

    let (status, body) = call(&app, "POST", "/timer/pause", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot pause while the timer is idle");
}

#[tokio::test]
async fn remote_failure_is_bad_gateway_with_server_message() {
    let h = Harness::new(Some(180));
    let app = create_router(Arc::clone(&h.state));
    call(&app, "POST", "/timer/start", Some(json!({ "focus": "Scales" }))).await;
    h.clock.advance_secs(61);
    call(&app, "POST", "/timer/finish", None).await;

    h.api.fail_next_saves("Database unavailable");
    let (status, body) = call(&app, "POST", "/timer/save", Some(json!({ "notes": "" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Database unavailable");

    let (_, body) = call(&app, "GET", "/timer", None).await;
    assert_eq!(body["timer"]["phase"], "stopped");
}

#[tokio::test]
async fn lifecycle_endpoints_reach_the_observer() {
    let h = Harness::new(Some(180));
    let app = create_router(Arc::clone(&h.state));
    let observer = tokio::spawn(lifecycle_observer_task(Arc::clone(&h.state)));
    tokio::task::yield_now().await;

    call(&app, "POST", "/timer/start", Some(json!({ "focus": "Etudes" }))).await;

    let (status, _) = call(&app, "POST", "/lifecycle/background", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    while !h.state.is_in_background() {
        tokio::task::yield_now().await;
    }

    h.clock.advance_secs(600);
    let (status, _) = call(&app, "POST", "/lifecycle/foreground", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    while h.state.is_in_background() {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.state.snapshot().unwrap().elapsed_seconds, 600);

    let (status, _) = call(&app, "POST", "/lifecycle/sideways", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    observer.abort();
}

#[tokio::test]
async fn health_reports_version() {
    let h = Harness::new(Some(180));
    let app = create_router(Arc::clone(&h.state));

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
