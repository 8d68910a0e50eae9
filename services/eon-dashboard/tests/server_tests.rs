//! Status API tests over an in-memory transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use eon_common::EonResult;
use eon_dashboard::server::{create_router, AppState};
use eon_dashboard::state::DashboardState;
use eon_fetch::{AssetTransport, FetchResponse, RetrievalPipeline, SourceRoot};
use eon_ingest::{NightRegistry, Session, SourceRoots};
use serde_json::Value;
use test_utils::{night_assets, registry_json, CURATED_EXPID, NEXT_NIGHT, NIGHT};
use tokio_test::assert_ok;
use tower::ServiceExt;

const EON_ROOT: &str = "https://eon.test/eon/";
const DATA_ROOT: &str = "https://eon.test/data/";

#[derive(Default)]
struct MemoryTransport {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryTransport {
    fn serve_night(&self, root: &str, relative: &str, night: &str) {
        let base = SourceRoot::parse(root).unwrap().join(relative);
        let mut files = self.files.lock().unwrap();
        for (name, payload) in night_assets(night) {
            files.insert(base.join(&name).to_string(), payload);
        }
    }
}

#[async_trait]
impl AssetTransport for MemoryTransport {
    async fn get(&self, location: &SourceRoot) -> EonResult<FetchResponse> {
        Ok(match self.files.lock().unwrap().get(&location.to_string()) {
            Some(body) => FetchResponse::ok(body.clone()),
            None => FetchResponse::status(404),
        })
    }
}

fn app_with_registry(transport: MemoryTransport, registry: NightRegistry) -> (Router, Arc<AppState>) {
    let roots = SourceRoots {
        eon_root: SourceRoot::parse(EON_ROOT).unwrap(),
        data_root: SourceRoot::parse(DATA_ROOT).unwrap(),
        local_root: SourceRoot::parse("./local").unwrap(),
    };
    let host = Arc::new(DashboardState::new());
    let session = Arc::new(Session::new(
        RetrievalPipeline::new(Arc::new(transport)),
        roots,
        registry,
        host.clone(),
    ));
    let state = Arc::new(AppState::new(session, host));
    (create_router(state.clone()), state)
}

fn app(transport: MemoryTransport) -> (Router, Arc<AppState>) {
    let registry = NightRegistry::from_json(&registry_json()).unwrap();
    app_with_registry(transport, registry)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(MemoryTransport::default());
    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_nights_lists_registry_calendar() {
    let (app, _) = app(MemoryTransport::default());
    let (status, json) = get_json(&app, "/nights").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["default_night"], NEXT_NIGHT);
    let nights = json["nights"].as_array().unwrap();
    assert_eq!(nights.len(), 3);
    assert_eq!(nights[0]["availability"], "no_data");
    assert_eq!(nights[1]["night"], NIGHT);
    assert_eq!(nights[1]["availability"], "available");
    assert_eq!(nights[1]["curated_exposure_id"], CURATED_EXPID);
    assert_eq!(nights[1]["exposures"], 3);
    assert_eq!(nights[2]["availability"], "missing");
}

#[tokio::test]
async fn test_select_night_loads_everything() {
    let transport = MemoryTransport::default();
    transport.serve_night(EON_ROOT, NIGHT, NIGHT);
    let (app, state) = app(transport);

    let (status, report) = post_json(&app, "/night", serde_json::json!({ "night": NIGHT })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["night"], NIGHT);
    assert_eq!(report["assets"]["moves"]["state"], "success");
    assert_eq!(report["assets"]["back_image"]["state"], "success");
    assert_eq!(state.host.published_keys().len(), 6);

    let (_, status) = get_json(&app, "/status").await;
    assert_eq!(status["night"], NIGHT);
    assert_eq!(status["assets"]["summary"]["state"], "success");
    let lines = status["status"].as_array().unwrap();
    assert!(lines
        .iter()
        .any(|line| line["slot"] == "title"
            && line["text"] == "20240101 Focalplane End-of-Night Summary"));

    let (status, asset) = get_json(&app, "/assets/theSummary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(asset["asset"]["type"], "scientific_table");
    assert_eq!(asset["asset"]["rows"], 3);

    let (_, front) = get_json(&app, "/assets/theFront").await;
    assert_eq!(front["asset"]["mime_type"], "image/jpeg");
    assert_eq!(front["asset"]["width"], 32);
}

#[tokio::test]
async fn test_failed_assets_are_reported_per_asset() {
    // Nothing is served: every asset fails, the request still succeeds.
    let (app, state) = app(MemoryTransport::default());

    let (status, report) = post_json(&app, "/night", serde_json::json!({ "night": NIGHT })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["assets"]["calib"]["state"], "error");
    assert_eq!(report["assets"]["calib"]["kind"], "source_exhausted");
    assert!(state.host.published_keys().is_empty());

    let (status, _) = get_json(&app, "/assets/theCalib").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_night_is_bad_request() {
    let (app, state) = app(MemoryTransport::default());

    let (status, json) = post_json(&app, "/night", serde_json::json!({ "night": "2024-01-01" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid night"));
    assert!(state.session.current_night().is_none());

    let (status, _) = post_json(
        &app,
        "/night",
        serde_json::json!({ "night": NIGHT, "eon_expid": "abc", "wait": false }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_default_night_needs_registry() {
    let (app, _) = app_with_registry(MemoryTransport::default(), NightRegistry::default());
    let (status, _) = post_json(&app, "/night", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_asset_key() {
    let (app, _) = app(MemoryTransport::default());
    let (status, json) = get_json(&app, "/assets/theNothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Unknown asset key"));
}

#[tokio::test]
async fn test_background_selection() {
    let transport = MemoryTransport::default();
    transport.serve_night(EON_ROOT, NIGHT, NIGHT);
    let (app, state) = app(transport);

    let (status, json) = post_json(
        &app,
        "/night",
        serde_json::json!({ "night": NIGHT, "wait": false }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["night"], NIGHT);

    let loaded = tokio::time::timeout(Duration::from_secs(5), async {
        while state.host.published_keys().len() < 6 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert_ok!(loaded);
    assert_eq!(
        state.session.current_night().map(|n| n.to_string()),
        Some(NIGHT.to_string())
    );
}
