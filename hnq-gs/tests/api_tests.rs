//! Integration tests for the game server HTTP API
//!
//! The router runs over an in-memory item source, so these tests cover
//! routing, status mapping and the session protocol without the network.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hnq_common::events::{EventBus, GameEvent};
use hnq_common::{ItemRecord, StoryId};
use hnq_gs::acquire::{AcquisitionPipeline, FetchFailure, ItemSource};
use hnq_gs::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

// ============================================================================
// Helpers
// ============================================================================

struct FakeSource {
    ids: Vec<StoryId>,
    items: HashMap<StoryId, ItemRecord>,
}

impl FakeSource {
    fn new(scores: &[u64]) -> Self {
        let records: Vec<ItemRecord> = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let id = 1000 + i as u64;
                ItemRecord::new(id, format!("Story number {id}"), score)
            })
            .collect();
        Self {
            ids: records.iter().map(|r| r.id).collect(),
            items: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    fn titled(titles: &[&str]) -> Self {
        let records: Vec<ItemRecord> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| ItemRecord::new(i as u64 + 1, *title, 1))
            .collect();
        Self {
            ids: records.iter().map(|r| r.id).collect(),
            items: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    fn without(mut self, id: u64) -> Self {
        self.items.remove(&StoryId(id));
        self
    }
}

#[async_trait]
impl ItemSource for FakeSource {
    async fn story_ids(&self) -> Result<Vec<StoryId>, FetchFailure> {
        Ok(self.ids.clone())
    }

    async fn item(&self, id: StoryId) -> Result<ItemRecord, FetchFailure> {
        self.items
            .get(&id)
            .cloned()
            .ok_or(FetchFailure::ItemNotFound(id))
    }
}

fn setup_app_with(source: FakeSource, game_limit: usize) -> (Router, Arc<EventBus>) {
    let events = Arc::new(EventBus::new(64));
    let pipeline = AcquisitionPipeline::new(Arc::new(source), None);
    let state = AppState::new(
        pipeline,
        Arc::clone(&events),
        NonZeroUsize::new(game_limit).unwrap(),
        NonZeroUsize::new(100).unwrap(),
    );
    (build_router(state), events)
}

fn setup_app(scores: &[u64]) -> Router {
    setup_app_with(FakeSource::new(scores), 20).0
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn start_session(app: &Router) -> String {
    let (status, body) = send(app, test_request("POST", "/api/v1/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(&[1]);
    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hnq-gs");
    assert!(body["version"].is_string());
}

// ============================================================================
// Session Protocol
// ============================================================================

#[tokio::test]
async fn test_create_session_initial_view() {
    let app = setup_app(&[10, 200, 0]);
    let (status, body) = send(&app, test_request("POST", "/api/v1/sessions")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["session_id"].is_string());

    let view = &body["view"];
    assert_eq!(view["status"], "playing");
    assert_eq!(view["loading"], false);
    assert_eq!(view["cursor"], 0);
    assert_eq!(view["total_items"], 3);
    assert_eq!(view["cumulative_score"], 0);
    assert_eq!(view["round_state"], "awaiting_guess");
    assert_eq!(view["current_item"]["title"], "Story number 1000");
    // Score stays hidden until the reveal
    assert!(view["current_item"].get("score").is_none());
}

#[tokio::test]
async fn test_full_game_scenario() {
    let app = setup_app(&[10, 200, 0]);
    let id = start_session(&app).await;
    let guess_uri = format!("/api/v1/sessions/{id}/guess");
    let advance_uri = format!("/api/v1/sessions/{id}/advance");

    let mut points = Vec::new();
    for (round, guess) in [10, 150, 5].into_iter().enumerate() {
        let (status, body) = send(&app, json_request("POST", &guess_uri, json!({ "guess": guess }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["cursor"], round);
        assert_eq!(body["view"]["round_state"], "revealed");
        points.push(body["outcome"]["points"].as_u64().unwrap());

        let (status, _) = send(&app, test_request("POST", &advance_uri)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(points, vec![100, 50, 0]);

    let (status, view) = send(&app, test_request("GET", &format!("/api/v1/sessions/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "finished");
    assert_eq!(view["final_score"], 150);
    assert_eq!(view["cumulative_score"], 150);
    assert_eq!(view["history"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_double_submit_is_conflict_and_scores_once() {
    let app = setup_app(&[100, 5]);
    let id = start_session(&app).await;
    let guess_uri = format!("/api/v1/sessions/{id}/guess");

    let (status, body) = send(&app, json_request("POST", &guess_uri, json!({ "guess": "95" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["cumulative_score"], 50);

    let (status, body) = send(&app, json_request("POST", &guess_uri, json!({ "guess": "100" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already revealed"));

    let (_, view) = send(&app, test_request("GET", &format!("/api/v1/sessions/{id}"))).await;
    assert_eq!(view["cumulative_score"], 50);
}

#[tokio::test]
async fn test_pending_guess_submitted_without_body() {
    let app = setup_app(&[42]);
    let id = start_session(&app).await;
    let guess_uri = format!("/api/v1/sessions/{id}/guess");

    let (status, view) = send(&app, json_request("PUT", &guess_uri, json!({ "guess": "40" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["pending_guess"], "40");
    assert_eq!(view["cumulative_score"], 0);

    let (status, body) = send(&app, test_request("POST", &guess_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["guess"], 40);
    assert_eq!(body["outcome"]["points"], 50);
    assert_eq!(body["view"]["current_item"]["score"], 42);
}

#[tokio::test]
async fn test_non_numeric_guess_scores_zero() {
    let app = setup_app(&[7]);
    let id = start_session(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/api/v1/sessions/{id}/guess"), json!({ "guess": "seven" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["points"], 0);
    assert!(body["outcome"]["guess"].is_null());
}

#[tokio::test]
async fn test_fractional_guess_keeps_raw_text() {
    let app = setup_app(&[41]);
    let id = start_session(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/api/v1/sessions/{id}/guess"), json!({ "guess": 41.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["raw_guess"], "41.5");
    assert_eq!(body["outcome"]["points"], 0);
}

#[tokio::test]
async fn test_malformed_guess_body_leaves_round_open() {
    let app = setup_app(&[7, 8]);
    let id = start_session(&app).await;
    let guess_uri = format!("/api/v1/sessions/{id}/guess");

    let truncated = Request::builder()
        .method("POST")
        .uri(&guess_uri)
        .header("content-type", "application/json")
        .body(Body::from("{\"gues"))
        .unwrap();
    let (status, body) = send(&app, truncated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, json_request("POST", &guess_uri, json!({ "guess": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, view) = send(&app, test_request("GET", &format!("/api/v1/sessions/{id}"))).await;
    assert_eq!(view["round_state"], "awaiting_guess");
    assert_eq!(view["cumulative_score"], 0);

    // The round still accepts a real guess
    let (status, body) = send(&app, json_request("POST", &guess_uri, json!({ "guess": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["points"], 100);
}

#[tokio::test]
async fn test_advance_before_reveal_is_conflict() {
    let app = setup_app(&[1, 2]);
    let id = start_session(&app).await;

    let (status, _) = send(&app, test_request("POST", &format!("/api/v1/sessions/{id}/advance"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_finished_session_rejects_transitions() {
    let app = setup_app(&[3]);
    let id = start_session(&app).await;
    let guess_uri = format!("/api/v1/sessions/{id}/guess");
    let advance_uri = format!("/api/v1/sessions/{id}/advance");

    send(&app, json_request("POST", &guess_uri, json!({ "guess": 3 }))).await;
    let (_, view) = send(&app, test_request("POST", &advance_uri)).await;
    assert_eq!(view["status"], "finished");

    let (status, _) = send(&app, test_request("POST", &advance_uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, json_request("POST", &guess_uri, json!({ "guess": 3 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup_app(&[1]);
    let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());

    let (status, _) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session() {
    let app = setup_app(&[1]);
    let id = start_session(&app).await;
    let uri = format!("/api/v1/sessions/{id}");

    let (status, _) = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_acquisition_failure_is_unplayable() {
    let (app, events) = setup_app_with(FakeSource::new(&[1, 2, 3]).without(1001), 20);
    let mut rx = events.subscribe();

    let (status, body) = send(&app, test_request("POST", "/api/v1/sessions")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["unplayable"], true);
    assert!(body["error"].as_str().unwrap().contains("1001"));

    let event = rx.recv().await.unwrap();
    assert!(matches!(event, GameEvent::AcquisitionFailed { .. }));
}

#[tokio::test]
async fn test_game_limit_applies() {
    let (app, _) = setup_app_with(FakeSource::new(&[1, 2, 3, 4, 5]), 2);
    let (_, body) = send(&app, test_request("POST", "/api/v1/sessions")).await;
    assert_eq!(body["view"]["total_items"], 2);
}

#[tokio::test]
async fn test_events_emitted_for_transitions() {
    let (app, events) = setup_app_with(FakeSource::new(&[9]), 20);
    let mut rx = events.subscribe();

    let id = start_session(&app).await;
    send(
        &app,
        json_request("POST", &format!("/api/v1/sessions/{id}/guess"), json!({ "guess": 9 })),
    )
    .await;
    send(&app, test_request("POST", &format!("/api/v1/sessions/{id}/advance"))).await;

    let types: Vec<&'static str> = [
        rx.recv().await.unwrap(),
        rx.recv().await.unwrap(),
        rx.recv().await.unwrap(),
    ]
    .iter()
    .map(GameEvent::event_type)
    .collect();
    assert_eq!(types, vec!["SessionStarted", "GuessScored", "SessionFinished"]);
}

#[tokio::test]
async fn test_invalid_session_id_is_bad_request() {
    let app = setup_app(&[1]);
    let response = app
        .oneshot(test_request("GET", "/api/v1/sessions/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Browse
// ============================================================================

#[tokio::test]
async fn test_browse_filters_titles() {
    let source = FakeSource::titled(&["Rust in production", "Go generics", "Why rust?"]);
    let (app, _) = setup_app_with(source, 20);

    let (status, body) = send(&app, test_request("GET", "/api/v1/stories?q=RUST")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_fetched"], 3);

    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Rust in production", "Why rust?"]);
}

#[tokio::test]
async fn test_browse_tolerates_failed_items() {
    let source = FakeSource::titled(&["One", "Two", "Three"]).without(2);
    let (app, _) = setup_app_with(source, 20);

    let (status, body) = send(&app, test_request("GET", "/api/v1/stories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["failed_ids"], json!([2]));
}
