//! Session-level types: identifiers, inputs, per-modality analysis payloads,
//! the orchestrator's state machine and the final report.
//!
//! A `SessionReport` is created once per run and handed to the caller; nothing
//! here is retained between sessions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::emotion::{Emotion, EmotionDistribution};
use crate::error::{SessionError, Stage};
use crate::fusion::{FusionResult, ModalityConfidence};

static SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique, timestamp-based session identifier (`YYYYMMDD_HHMMSS_<seq>`).
/// Collaborator artifacts are namespaced under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a recorded medium lives. Transport is the collaborator's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaRef {
    Path(PathBuf),
    Url(String),
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Path(p) => write!(f, "{}", p.display()),
            MediaRef::Url(u) => f.write_str(u),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    pub video: MediaRef,
    /// Defaults to the video container (recordings usually carry both tracks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaRef>,
}

impl SessionInput {
    pub fn new(video: MediaRef) -> Self {
        Self { video, audio: None }
    }

    pub fn with_audio(mut self, audio: MediaRef) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn audio_source(&self) -> &MediaRef {
        self.audio.as_ref().unwrap_or(&self.video)
    }
}

/// One analyzed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp_secs: f64,
    pub emotions: EmotionDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub emotions: EmotionDistribution,
    pub dominant_emotion: Emotion,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<TimelineEntry>,
}

impl VideoAnalysis {
    pub fn new(emotions: EmotionDistribution) -> Self {
        Self {
            dominant_emotion: emotions.dominant(),
            emotions,
            timeline: Vec::new(),
        }
    }

    /// Averages frames that yielded a face. `None` for an empty timeline.
    pub fn from_timeline(timeline: Vec<TimelineEntry>) -> Option<Self> {
        let frames: Vec<EmotionDistribution> = timeline.iter().map(|t| t.emotions).collect();
        let emotions = EmotionDistribution::average(&frames)?;
        Some(Self {
            dominant_emotion: emotions.dominant(),
            emotions,
            timeline,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAnalysis {
    pub emotions: EmotionDistribution,
    pub dominant_emotion: Emotion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl SpeechAnalysis {
    pub fn new(emotions: EmotionDistribution) -> Self {
        Self {
            dominant_emotion: emotions.dominant(),
            emotions,
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub emotions: EmotionDistribution,
    pub dominant_emotion: Emotion,
    #[serde(default)]
    pub transcript: String,
}

impl TextAnalysis {
    pub fn new(emotions: EmotionDistribution, transcript: impl Into<String>) -> Self {
        Self {
            dominant_emotion: emotions.dominant(),
            emotions,
            transcript: transcript.into(),
        }
    }
}

/// Orchestrator state machine. `Failed` is reachable from any analyzing/fusing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    VideoAnalyzing,
    SpeechAnalyzing,
    TextAnalyzing,
    Fusing,
    Visualizing,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Complete,
    Failed,
}

/// Which stage failed and why, for rendering to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub stage: Stage,
    pub cause: String,
}

impl From<&SessionError> for Failure {
    fn from(e: &SessionError) -> Self {
        Self {
            stage: e.stage(),
            cause: e.to_string(),
        }
    }
}

/// Output of one orchestration run. Same shape for success and failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub state_trail: Vec<SessionState>,
    #[serde(default)]
    pub failure: Option<Failure>,
    pub video: Option<VideoAnalysis>,
    pub speech: Option<SpeechAnalysis>,
    pub text: Option<TextAnalysis>,
    pub fused: Option<EmotionDistribution>,
    pub dominant_emotion: Option<Emotion>,
    pub confidence: Option<ModalityConfidence>,
    pub visualization: Option<PathBuf>,
    #[serde(default)]
    pub visualization_error: Option<String>,
}

impl SessionReport {
    /// Fresh report in `Idle`.
    pub fn begin(session_id: SessionId) -> Self {
        Self {
            session_id,
            status: SessionStatus::Failed,
            state_trail: vec![SessionState::Idle],
            failure: None,
            video: None,
            speech: None,
            text: None,
            fused: None,
            dominant_emotion: None,
            confidence: None,
            visualization: None,
            visualization_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state_trail
            .last()
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    pub(crate) fn enter(&mut self, state: SessionState) {
        info!(target: "session", session_id = %self.session_id, ?state, "state transition");
        self.state_trail.push(state);
    }

    pub(crate) fn apply_fusion(&mut self, r: FusionResult) {
        self.fused = Some(r.fused);
        self.dominant_emotion = Some(r.dominant_emotion);
        self.confidence = Some(r.confidence);
    }

    /// Terminal failure. Analyses gathered before the failing stage are dropped.
    pub(crate) fn fail(mut self, err: &SessionError) -> Self {
        self.video = None;
        self.speech = None;
        self.text = None;
        self.enter(SessionState::Failed);
        self.status = SessionStatus::Failed;
        self.failure = Some(Failure::from(err));
        self
    }

    pub(crate) fn complete(mut self) -> Self {
        self.enter(SessionState::Complete);
        self.status = SessionStatus::Complete;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_ids_are_unique_within_a_second() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().len() >= "20260101_000000_1".len());
    }

    #[test]
    fn audio_defaults_to_video_container() {
        let input = SessionInput::new(MediaRef::Path("rec.webm".into()));
        assert_eq!(input.audio_source(), &MediaRef::Path("rec.webm".into()));
        let input = input.with_audio(MediaRef::Url("http://x/a.wav".into()));
        assert_eq!(input.audio_source(), &MediaRef::Url("http://x/a.wav".into()));
    }

    #[test]
    fn input_deserializes_from_tagged_refs() {
        let v = json!({"video": {"path": "/tmp/rec.webm"}});
        let input: SessionInput = serde_json::from_value(v).unwrap();
        assert_eq!(input.video, MediaRef::Path("/tmp/rec.webm".into()));
        assert!(input.audio.is_none());
    }

    #[test]
    fn video_timeline_average_sets_dominant() {
        let timeline = vec![
            TimelineEntry {
                timestamp_secs: 0.0,
                emotions: EmotionDistribution::zero().with(Emotion::Sad, 80.0),
            },
            TimelineEntry {
                timestamp_secs: 0.5,
                emotions: EmotionDistribution::zero().with(Emotion::Happy, 60.0),
            },
        ];
        let v = VideoAnalysis::from_timeline(timeline).unwrap();
        assert_eq!(v.dominant_emotion, Emotion::Sad);
        assert_eq!(v.timeline.len(), 2);
        assert!(VideoAnalysis::from_timeline(Vec::new()).is_none());
    }

    #[test]
    fn failed_report_shape() {
        let r = SessionReport::begin(SessionId::generate())
            .fail(&SessionError::analyzer(Stage::Video, "no face detected"));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], json!("failed"));
        assert_eq!(v["failure"]["stage"], json!("video"));
        assert_eq!(v["state_trail"], json!(["idle", "failed"]));
        assert!(v["fused"].is_null());
        assert_eq!(v.get("visualization_error"), Some(&json!(null)));
    }

    #[test]
    fn failure_drops_earlier_analyses() {
        let mut r = SessionReport::begin(SessionId::generate());
        r.enter(SessionState::VideoAnalyzing);
        r.video = Some(VideoAnalysis::new(
            EmotionDistribution::zero().with(Emotion::Happy, 80.0),
        ));
        r.enter(SessionState::SpeechAnalyzing);
        let r = r.fail(&SessionError::analyzer(Stage::Speech, "returned an empty emotion distribution"));

        let v = serde_json::to_value(&r).unwrap();
        assert!(v["video"].is_null());
        assert!(v["speech"].is_null());
        assert_eq!(v["failure"]["stage"], json!("speech"));
    }

    #[test]
    fn complete_report_serializes_null_failure() {
        let v = serde_json::to_value(SessionReport::begin(SessionId::generate()).complete()).unwrap();
        assert_eq!(v.get("failure"), Some(&json!(null)));
    }
}
