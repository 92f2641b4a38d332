//! # Session Orchestrator
//!
//! Drives one session end to end:
//! `Idle → VideoAnalyzing → SpeechAnalyzing → TextAnalyzing → Fusing → Visualizing → Complete`,
//! with `Failed` reachable from any analyzing/fusing state.
//!
//! Stages run sequentially. The first failing stage aborts the session and the
//! later analyzers are never called. Analyzer failures are strict here even
//! though the fusion engine itself tolerates missing modalities; both
//! behaviours are kept as they are observable. Visualization failures are
//! logged and attached to an otherwise complete report.
//!
//! No state is kept between calls; concurrent sessions are safe as long as
//! collaborators write under the session's workspace.

use metrics::{counter, histogram};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::analyzers::{AnalyzerSet, ChartInput, DynVisualizer};
use crate::emotion::EmotionDistribution;
use crate::error::{SessionError, Stage};
use crate::fusion::FusionEngine;
use crate::session::{SessionId, SessionInput, SessionReport, SessionState};
use crate::workspace::SessionWorkspace;

pub struct SessionOrchestrator {
    analyzers: AnalyzerSet,
    visualizer: DynVisualizer,
    engine: FusionEngine,
    artifact_root: PathBuf,
    cleanup_failed: bool,
}

impl SessionOrchestrator {
    pub fn new(
        analyzers: AnalyzerSet,
        visualizer: DynVisualizer,
        engine: FusionEngine,
        artifact_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            analyzers,
            visualizer,
            engine,
            artifact_root: artifact_root.into(),
            cleanup_failed: false,
        }
    }

    /// Remove the session workspace when a session fails.
    pub fn with_cleanup_on_failure(mut self, on: bool) -> Self {
        self.cleanup_failed = on;
        self
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Run one session under a freshly generated identifier.
    pub async fn analyze_session(&self, input: &SessionInput) -> SessionReport {
        self.analyze_session_with_id(SessionId::generate(), input)
            .await
    }

    pub async fn analyze_session_with_id(
        &self,
        session_id: SessionId,
        input: &SessionInput,
    ) -> SessionReport {
        let started = Instant::now();
        info!(
            target: "session",
            %session_id,
            video = %input.video,
            audio = %input.audio_source(),
            "session started"
        );

        let report = self.run(session_id, input).await;

        let status = if report.is_complete() { "complete" } else { "failed" };
        counter!("sessions_total", "status" => status).increment(1);
        histogram!("session_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        match &report.failure {
            None => info!(
                target: "session",
                session_id = %report.session_id,
                dominant = ?report.dominant_emotion,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "session complete"
            ),
            Some(f) => error!(
                target: "session",
                session_id = %report.session_id,
                stage = %f.stage,
                cause = %f.cause,
                "session failed"
            ),
        }
        report
    }

    async fn run(&self, session_id: SessionId, input: &SessionInput) -> SessionReport {
        let mut report = SessionReport::begin(session_id.clone());

        let workspace = match SessionWorkspace::create(&self.artifact_root, &session_id) {
            Ok(ws) => Some(ws),
            Err(e) => {
                // Numeric results stay usable without a chart location.
                warn!(target: "session", %session_id, error = %e, "no artifact workspace");
                None
            }
        };

        // 1) Video: precondition for a valid session.
        report.enter(SessionState::VideoAnalyzing);
        let video = self
            .analyzers
            .video
            .analyze_video(&session_id, &input.video)
            .await;
        let video = match require(Stage::Video, video, |v| &v.emotions) {
            Ok(v) => v,
            Err(e) => return self.abort(report, &e, workspace.as_ref()),
        };
        let video_dist = video.emotions;
        report.video = Some(video);

        // 2) Speech
        report.enter(SessionState::SpeechAnalyzing);
        let speech = self
            .analyzers
            .speech
            .analyze_speech(&session_id, input.audio_source())
            .await;
        let speech = match require(Stage::Speech, speech, |s| &s.emotions) {
            Ok(s) => s,
            Err(e) => return self.abort(report, &e, workspace.as_ref()),
        };
        let speech_dist = speech.emotions;
        report.speech = Some(speech);

        // 3) Text
        report.enter(SessionState::TextAnalyzing);
        let text = self
            .analyzers
            .text
            .analyze_text(&session_id, input.audio_source())
            .await;
        let text = match require(Stage::Text, text, |t| &t.emotions) {
            Ok(t) => t,
            Err(e) => return self.abort(report, &e, workspace.as_ref()),
        };
        let text_dist = text.emotions;
        report.text = Some(text);

        // 4) Fusion
        report.enter(SessionState::Fusing);
        let fused = self
            .engine
            .fuse(Some(&video_dist), Some(&speech_dist), Some(&text_dist));
        let fusion = match fused {
            Ok(r) => r,
            Err(e) => return self.abort(report, &e, workspace.as_ref()),
        };
        info!(
            target: "session",
            %session_id,
            dominant = %fusion.dominant_emotion,
            video_conf = fusion.confidence.video,
            audio_conf = fusion.confidence.audio,
            text_conf = fusion.confidence.text,
            "fusion done"
        );

        // 5) Visualization (non-fatal)
        report.enter(SessionState::Visualizing);
        let chart = match (&workspace, &report.video, &report.speech, &report.text) {
            (Some(ws), Some(v), Some(s), Some(t)) => {
                let chart_input = ChartInput {
                    video: v,
                    speech: s,
                    text: t,
                    fusion: &fusion,
                };
                self.visualizer
                    .render(chart_input, &ws.visualization_path())
                    .await
                    .map_err(|e| SessionError::Visualization(format!("{e:#}")))
            }
            _ => Err(SessionError::Visualization(
                "no session workspace to write into".to_string(),
            )),
        };
        match chart {
            Ok(path) => report.visualization = Some(path),
            Err(e) => {
                counter!("visualization_failures_total").increment(1);
                warn!(target: "session", %session_id, error = %e, "visualization skipped");
                report.visualization_error = Some(e.to_string());
            }
        }

        report.apply_fusion(fusion);
        report.complete()
    }

    fn abort(
        &self,
        report: SessionReport,
        err: &SessionError,
        workspace: Option<&SessionWorkspace>,
    ) -> SessionReport {
        let stage = err.stage();
        counter!("session_stage_failures_total", "stage" => stage.as_str()).increment(1);
        error!(
            target: "session",
            session_id = %report.session_id,
            state = ?report.state(),
            %stage,
            error = %err,
            "stage failed, aborting session"
        );
        if self.cleanup_failed {
            if let Some(ws) = workspace {
                if let Err(e) = ws.cleanup() {
                    debug!(target: "session", error = %e, "failed session keeps its workspace");
                }
            }
        }
        report.fail(err)
    }
}

/// Turn an analyzer outcome into a usable result or a typed failure.
fn require<T>(
    stage: Stage,
    outcome: anyhow::Result<Option<T>>,
    emotions: impl Fn(&T) -> &EmotionDistribution,
) -> Result<T, SessionError> {
    match outcome {
        Err(e) => Err(SessionError::analyzer(stage, format!("{e:#}"))),
        Ok(None) => Err(SessionError::analyzer(stage, "returned no data")),
        Ok(Some(v)) if emotions(&v).is_empty() => Err(SessionError::analyzer(
            stage,
            "returned an empty emotion distribution",
        )),
        Ok(Some(v)) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::FixtureAnalyzer;
    use crate::session::SpeechAnalysis;

    #[test]
    fn require_classifies_outcomes() {
        let ok = require(
            Stage::Speech,
            Ok(Some(SpeechAnalysis::new(
                EmotionDistribution::from_pairs([("sad", 1.0)]),
            ))),
            |s| &s.emotions,
        );
        assert!(ok.is_ok());

        let none: anyhow::Result<Option<SpeechAnalysis>> = Ok(None);
        let e = require(Stage::Speech, none, |s| &s.emotions).unwrap_err();
        assert_eq!(e.stage(), Stage::Speech);

        let empty = Ok(Some(SpeechAnalysis::new(EmotionDistribution::zero())));
        assert!(require(Stage::Speech, empty, |s| &s.emotions).is_err());

        let err: anyhow::Result<Option<SpeechAnalysis>> = Err(anyhow::anyhow!("timeout"));
        let e = require(Stage::Speech, err, |s| &s.emotions).unwrap_err();
        assert!(e.to_string().contains("timeout"));
    }

    #[test]
    fn fixture_set_builds() {
        let f = FixtureAnalyzer::default();
        assert!(!f.video.emotions.is_empty());
        let _ = AnalyzerSet::fixture();
    }
}
