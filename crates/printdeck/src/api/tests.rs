use axum::body::Body;
use axum::http::Request;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::config::CardConfig;
use crate::host::testing::FixedStates;
use crate::host::testing::RecordingHost;
use crate::host::testing::Unreachable;
use crate::state::EntityState;
use crate::state::StateSnapshot;

fn snapshot() -> StateSnapshot {
    vec![
        EntityState::new("sensor.k1_max_progress", "45"),
        EntityState::new("sensor.k1_max_state_text", "Printing"),
        EntityState::new("switch.k1_max_light", "off"),
        EntityState::new("sensor.k2plus_progress", "100"),
        EntityState::new("sensor.k2plus_state_text", "Idle"),
    ]
    .into()
}

fn router_with(source: Arc<dyn StateSource>) -> (Router, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::new("http://ha.local:8123"));
    let state = AppState::new(Card::new(CardConfig::default()), source, host.clone());
    (create_router(Arc::new(state)), host)
}

fn router() -> (Router, Arc<RecordingHost>) {
    router_with(Arc::new(FixedStates(snapshot())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_ping_and_info() {
    let (app, _) = router();

    let (status, body) = send(&app, "GET", "/v1/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = send(&app, "GET", "/v1/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["hostname"].is_string());
}

// =============================================================================
// Card state
// =============================================================================

#[tokio::test]
async fn test_printers_and_status() {
    let (app, _) = router();

    let (status, body) = send(&app, "GET", "/v1/printers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "printers": [
                { "key": "k1_max", "label": "K1 Max" },
                { "key": "k2plus", "label": "K2plus" },
            ],
            "selection": { "state": "selected", "key": "k1_max" },
        })
    );

    let (status, body) = send(&app, "GET", "/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["printer"], "k1_max");
    assert_eq!(body["status"]["progress"], 45.0);
    assert_eq!(body["status"]["state_text"], "Printing");
    assert_eq!(body["status"]["model"], "k1_max");
}

#[tokio::test]
async fn test_selection_persists_across_ticks() {
    let (app, _) = router();

    let (status, body) = send(&app, "PUT", "/v1/selection", Some(json!({ "key": "k2plus" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "state": "selected", "key": "k2plus" }));

    let (_, body) = send(&app, "GET", "/v1/status", None).await;
    assert_eq!(body["printer"], "k2plus");

    let (status, _) = send(&app, "PUT", "/v1/selection", Some(json!({ "key": "ender3" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/v1/card", None).await;
    assert_eq!(body["printer"]["key"], "k2plus");
    assert_eq!(body["header"]["printers"][1]["selected"], true);
}

#[tokio::test]
async fn test_no_printer() {
    let (app, host) = router_with(Arc::new(FixedStates(StateSnapshot::new())));

    let (status, _) = send(&app, "GET", "/v1/status", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/v1/card", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["printer"], Value::Null);

    let (status, _) = send(&app, "POST", "/v1/actions/pause", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_upstream_failure() {
    let (app, _) = router_with(Arc::new(Unreachable));

    let (status, body) = send(&app, "GET", "/v1/printers", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("503"));
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn test_actions() {
    let (app, host) = router();

    let (status, body) = send(&app, "POST", "/v1/actions/stop", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body,
        json!({
            "domain": "switch",
            "service": "turn_on",
            "payload": { "entity_id": "switch.k1_max_stop" },
        })
    );

    let (status, _) = send(&app, "POST", "/v1/actions/self_destruct", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let calls = host.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "turn_on");
}

#[tokio::test]
async fn test_toggle_controls() {
    let (app, host) = router();

    let (status, body) = send(&app, "POST", "/v1/controls/light/toggle", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["service"], "turn_on");
    assert_eq!(body["payload"], json!({ "entity_id": "switch.k1_max_light" }));

    let (status, _) = send(&app, "POST", "/v1/controls/fan_case/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/v1/controls/heater/toggle", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(host.calls().len(), 1);
}
