// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyzers;
pub mod api;
pub mod confidence;
pub mod config;
pub mod emotion;
pub mod error;
pub mod fusion;
pub mod metrics;
pub mod orchestrator;
pub mod session;
pub mod visualize;
pub mod weights;
pub mod workspace;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::confidence::confidence;
pub use crate::emotion::{Emotion, EmotionDistribution};
pub use crate::error::{SessionError, Stage};
pub use crate::fusion::{FusionEngine, FusionResult, ModalityConfidence};
pub use crate::orchestrator::SessionOrchestrator;
pub use crate::session::{SessionInput, SessionReport, SessionState, SessionStatus};
pub use crate::weights::{Modality, ModalityWeights, WeightsConfig};

use axum::Router;
use tracing::info;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::metrics::Metrics;

/// Build the full HTTP app from `AppConfig::load_default()`:
/// session/fuse routes plus `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    app_with_config(&cfg)
}

pub fn app_with_config(cfg: &AppConfig) -> anyhow::Result<Router> {
    let orchestrator = cfg.build_orchestrator()?;
    let metrics = Metrics::init(orchestrator.engine().weights())?;
    info!("router assembled");
    Ok(router(AppState::new(orchestrator)).merge(metrics.router()))
}
