use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::Config,
    engine::{EngineError, SelectionEngine},
    geo::{Location, Region},
    model::{Adventure, Vibe},
    session::SessionStore,
};

const NOTHING_NEARBY_MESSAGE: &str = "nothing nearby :(";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<SelectionEngine>,
    pub sessions: SessionStore,
}

#[derive(Debug, Deserialize)]
pub struct AdventureRequest {
    pub session_id: Option<Uuid>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub vibe: Vibe,
}

#[derive(Debug, Serialize)]
pub struct AdventureResponse {
    pub session_id: Uuid,
    pub adventure: Option<Adventure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RegionResponse {
    pub bounds: Region,
    pub center: Location,
    pub radius_ladder_miles: Vec<f64>,
    pub activity_radius_miles: f64,
    pub timezone: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_region(State(state): State<AppState>) -> Json<RegionResponse> {
    let region = state.engine.region();
    let settings = state.engine.settings();

    Json(RegionResponse {
        bounds: region,
        center: region.center(),
        radius_ladder_miles: settings.radius_ladder_miles.clone(),
        activity_radius_miles: settings.activity_radius_miles,
        timezone: state.config.app_timezone.clone(),
    })
}

pub async fn create_adventure(
    State(state): State<AppState>,
    Json(request): Json<AdventureRequest>,
) -> Result<Json<AdventureResponse>, StatusCode> {
    let location = Location::new(request.lat, request.lng);
    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);

    let context = state
        .sessions
        .get_with(session_id, async { Arc::new(Mutex::new(state.engine.new_context())) })
        .await;
    let mut context = context.lock().await;

    match context
        .request(&state.engine, location, request.vibe, chrono::Utc::now())
        .await
    {
        Ok(Some(adventure)) => {
            tracing::info!(
                "Session {} got {} ({:.2} mi)",
                session_id,
                adventure.id(),
                adventure.distance
            );
            Ok(Json(AdventureResponse {
                session_id,
                adventure: Some(adventure),
                message: None,
            }))
        }
        Ok(None) => Ok(Json(AdventureResponse {
            session_id,
            adventure: None,
            message: Some(NOTHING_NEARBY_MESSAGE.to_string()),
        })),
        Err(EngineError::OutsideRegion { lat, lng }) => {
            tracing::warn!("Rejected location outside region: ({}, {})", lat, lng);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            tracing::error!("Adventure selection failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    state.sessions.invalidate(&session_id).await;
    StatusCode::NO_CONTENT
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/region", get(get_region))
        .route("/adventures", post(create_adventure))
        .route("/sessions/:session_id", delete(delete_session))
        .with_state(state)
}
