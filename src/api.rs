use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::emotion::EmotionDistribution;
use crate::fusion::FusionResult;
use crate::orchestrator::SessionOrchestrator;
use crate::session::{SessionInput, SessionReport};
use crate::weights::WeightsConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: SessionOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sessions", post(analyze_session))
        .route("/fuse", post(fuse))
        .route("/weights", get(weights))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// 200 for a complete session, 422 for a failed one; same body shape.
async fn analyze_session(
    State(state): State<AppState>,
    Json(input): Json<SessionInput>,
) -> (StatusCode, Json<SessionReport>) {
    let report = state.orchestrator.analyze_session(&input).await;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(report))
}

#[derive(Debug, Deserialize)]
struct FuseReq {
    #[serde(default)]
    video: Option<EmotionDistribution>,
    #[serde(default)]
    audio: Option<EmotionDistribution>,
    #[serde(default)]
    text: Option<EmotionDistribution>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn fuse(
    State(state): State<AppState>,
    Json(req): Json<FuseReq>,
) -> Result<Json<FusionResult>, (StatusCode, Json<ErrorBody>)> {
    state
        .orchestrator
        .engine()
        .fuse(req.video.as_ref(), req.audio.as_ref(), req.text.as_ref())
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "fuse request rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
        })
}

async fn weights(State(state): State<AppState>) -> Json<WeightsConfig> {
    Json(state.orchestrator.engine().weights().to_config())
}
