//! Collaborator boundary: the three analyzers and the visualizer.
//!
//! Analyzers are injected into the orchestrator as trait objects, so the
//! heavyweight inference models live wherever the caller keeps them and tests
//! can pass doubles. An analyzer signals failure either with `Err` (transport
//! or model error) or `Ok(None)` (ran fine, found nothing usable).

pub mod fixture;
pub mod remote;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fusion::FusionResult;
use crate::session::{MediaRef, SessionId, SpeechAnalysis, TextAnalysis, VideoAnalysis};

pub use fixture::FixtureAnalyzer;
pub use remote::RemoteAnalyzer;

#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    async fn analyze_video(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> anyhow::Result<Option<VideoAnalysis>>;
}

#[async_trait]
pub trait SpeechAnalyzer: Send + Sync {
    async fn analyze_speech(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> anyhow::Result<Option<SpeechAnalysis>>;
}

/// Transcribes the audio internally, then classifies the transcript.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_text(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> anyhow::Result<Option<TextAnalysis>>;
}

/// Everything a chart needs: the three raw analyses plus the fused result.
#[derive(Debug, Clone, Copy)]
pub struct ChartInput<'a> {
    pub video: &'a VideoAnalysis,
    pub speech: &'a SpeechAnalysis,
    pub text: &'a TextAnalysis,
    pub fusion: &'a FusionResult,
}

#[async_trait]
pub trait Visualizer: Send + Sync {
    /// Render to `out` and return the artifact path.
    async fn render(&self, input: ChartInput<'_>, out: &Path) -> anyhow::Result<PathBuf>;
}

pub type DynVideoAnalyzer = Arc<dyn VideoAnalyzer>;
pub type DynSpeechAnalyzer = Arc<dyn SpeechAnalyzer>;
pub type DynTextAnalyzer = Arc<dyn TextAnalyzer>;
pub type DynVisualizer = Arc<dyn Visualizer>;

/// The three analyzers a session needs, bundled for construction.
#[derive(Clone)]
pub struct AnalyzerSet {
    pub video: DynVideoAnalyzer,
    pub speech: DynSpeechAnalyzer,
    pub text: DynTextAnalyzer,
}

impl AnalyzerSet {
    /// Deterministic analyzers returning fixed distributions.
    pub fn fixture() -> Self {
        let f = Arc::new(FixtureAnalyzer::default());
        Self {
            video: f.clone(),
            speech: f.clone(),
            text: f,
        }
    }
}
