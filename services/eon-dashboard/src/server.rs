//! HTTP status API for the dashboard.
//!
//! Provides endpoints for:
//! - Current night, status lines and per-asset load state
//! - The night calendar from the registry
//! - Selecting a night
//! - Summaries of published assets

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use eon_common::{AssetKind, EonError, ExposureId, Night};
use eon_ingest::{AssetLoadResult, NightAvailability, RegistryStatus, Session, SetNightOptions};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::state::{DashboardState, SlotStatus};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub night: Option<Night>,
    pub registry: Option<RegistryStatus>,
    pub status: Vec<SlotStatus>,
    pub assets: BTreeMap<AssetKind, AssetLoadResult>,
    pub published: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NightInfo {
    pub night: Night,
    pub exposures: usize,
    pub curated_exposure_id: Option<String>,
    pub availability: NightAvailability,
}

#[derive(Debug, Clone, Serialize)]
pub struct NightsResponse {
    pub default_night: Option<Night>,
    pub rundate: Option<String>,
    pub nights: Vec<NightInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub night: Night,
    pub message: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SelectNightRequest {
    /// Defaults to the most recent night in the registry
    pub night: Option<String>,
    pub eon_expid: Option<String>,
    #[serde(default)]
    pub local: bool,
    /// Wait for all six assets before responding
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

// ============================================================================
// Shared State
// ============================================================================

pub struct AppState {
    pub session: Arc<Session>,
    pub host: Arc<DashboardState>,
}

impl AppState {
    pub fn new(session: Arc<Session>, host: Arc<DashboardState>) -> Self {
        Self { session, host }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the status API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/nights", get(nights_handler))
        .route("/night", post(select_night_handler))
        .route("/assets/:key", get(asset_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "eon-dashboard"
    }))
}

/// GET /status - Current night, status lines and asset states
async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        service: "eon-dashboard".to_string(),
        night: state.session.current_night(),
        registry: state.session.registry_status(Utc::now()),
        status: state.host.slots(),
        assets: state.session.asset_states(),
        published: state.host.published_keys(),
    })
}

/// GET /nights - Registry calendar
async fn nights_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.session.registry();
    let nights = registry
        .nights()
        .map(|(night, entry)| NightInfo {
            night: night.clone(),
            exposures: entry.exposure_count(),
            curated_exposure_id: entry.curated().map(|id| id.to_string()),
            availability: entry.availability(),
        })
        .collect();

    Json(NightsResponse {
        default_night: state.session.default_night(),
        rundate: registry.rundate().map(str::to_string),
        nights,
    })
}

/// POST /night - Select a night and load its assets
async fn select_night_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SelectNightRequest>,
) -> Response {
    let night = match request.night {
        Some(night) => night,
        None => match state.session.default_night() {
            Some(night) => night.to_string(),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "No night given and the registry lists none",
                )
            }
        },
    };

    let options = SetNightOptions {
        exposure_id_override: request.eon_expid,
        local: request.local,
    };

    if !request.wait {
        // Reject bad input now; the background load would only log it.
        let parsed = match Night::parse(&night) {
            Ok(parsed) => parsed,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        if let Some(id) = options.exposure_id_override.as_deref() {
            if let Err(e) = ExposureId::parse(id) {
                return error_response(StatusCode::BAD_REQUEST, &e.to_string());
            }
        }

        let session = state.session.clone();
        tokio::spawn(async move {
            if let Err(e) = session.set_night(&night, options).await {
                warn!(error = %e, "Background night selection failed");
            }
        });
        info!(night = %parsed, "Accepted night selection");
        return (
            StatusCode::ACCEPTED,
            Json(AcceptedResponse {
                message: format!("Loading {}", parsed),
                night: parsed,
            }),
        )
            .into_response();
    }

    match state.session.set_night(&night, options).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(status_for(&e), &e.to_string()),
    }
}

/// GET /assets/:key - Summary of one published asset
async fn asset_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    if AssetKind::from_publish_key(&key).is_none() {
        return error_response(StatusCode::NOT_FOUND, &format!("Unknown asset key: {}", key));
    }

    match state.host.asset_summary(&key) {
        Some((summary, published_at)) => Json(serde_json::json!({
            "key": key,
            "published_at": published_at.to_rfc3339(),
            "asset": summary,
        }))
        .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Asset {} has not been loaded", key),
        ),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn status_for(error: &EonError) -> StatusCode {
    if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

// ============================================================================
// Server
// ============================================================================

/// Run the status API until the process exits.
pub async fn run_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting dashboard status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
