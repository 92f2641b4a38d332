//! Remote analyzers: face / speech / text inference served over HTTP.
//!
//! Request:  `POST <url>` with `{"session_id": "...", "media": {"path": "..."}}`
//! Response (any of the distribution forms; first one present wins):
//! ```json
//! { "emotions": {"happy": 71.2, ...},
//!   "predictions": [{"label": "joy", "score": 0.71}, ...],
//!   "top": {"label": "joy", "score": 0.71},
//!   "dominant_emotion": "happy", "timeline": [...],
//!   "duration_secs": 12.5, "transcript": "..." }
//! ```
//! An empty body, `null`, or HTTP 204 means "no data". Non-2xx is an error.
//! There is no retry here; a failed call is reported once.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{SpeechAnalyzer, TextAnalyzer, VideoAnalyzer};
use crate::emotion::{Emotion, EmotionDistribution};
use crate::session::{
    MediaRef, SessionId, SpeechAnalysis, TextAnalysis, TimelineEntry, VideoAnalysis,
};

#[derive(Debug, Clone)]
pub struct RemoteAnalyzer {
    http: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    session_id: &'a SessionId,
    media: &'a MediaRef,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    emotions: Option<EmotionDistribution>,
    #[serde(default)]
    predictions: Option<Vec<Prediction>>,
    #[serde(default)]
    top: Option<Prediction>,
    #[serde(default)]
    dominant_emotion: Option<String>,
    #[serde(default)]
    timeline: Vec<TimelineEntry>,
    #[serde(default)]
    duration_secs: Option<f64>,
    #[serde(default)]
    transcript: Option<String>,
}

impl RemoteResponse {
    fn distribution(&self) -> Option<EmotionDistribution> {
        if let Some(d) = self.emotions {
            return Some(d);
        }
        if let Some(preds) = &self.predictions {
            return Some(EmotionDistribution::from_predictions(
                preds.iter().map(|p| (p.label.as_str(), p.score)),
            ));
        }
        let top = self.top.as_ref()?;
        Emotion::parse(&top.label).map(|e| EmotionDistribution::from_top_label(e, top.score))
    }

    /// Reported label if it parses and the distribution agrees it is a maximum.
    fn dominant(&self, d: &EmotionDistribution) -> Emotion {
        let computed = d.dominant();
        match self.dominant_emotion.as_deref().and_then(Emotion::parse) {
            Some(reported) if d.get(reported) >= d.get(computed) => reported,
            _ => computed,
        }
    }
}

impl RemoteAnalyzer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("emotion-fusion/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building analyzer http client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, session: &SessionId, media: &MediaRef) -> Result<Option<RemoteResponse>> {
        let resp = self
            .http
            .post(&self.url)
            .json(&RemoteRequest {
                session_id: session,
                media,
            })
            .send()
            .await
            .with_context(|| format!("POST {}", self.url))?;

        let status = resp.status();
        let resp = resp
            .error_for_status()
            .with_context(|| format!("analyzer at {} returned {status}", self.url))?;

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp.text().await.context("reading analyzer body")?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!(target: "session", url = %self.url, %session, "analyzer returned no data");
            return Ok(None);
        }

        let parsed: RemoteResponse = serde_json::from_str(trimmed)
            .with_context(|| format!("parsing analyzer response from {}", self.url))?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl VideoAnalyzer for RemoteAnalyzer {
    async fn analyze_video(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> Result<Option<VideoAnalysis>> {
        let Some(r) = self.call(session, media).await? else {
            return Ok(None);
        };
        // Services that only return per-frame results get averaged here.
        let Some(emotions) = r.distribution() else {
            return Ok(VideoAnalysis::from_timeline(r.timeline));
        };
        Ok(Some(VideoAnalysis {
            dominant_emotion: r.dominant(&emotions),
            emotions,
            timeline: r.timeline,
        }))
    }
}

#[async_trait]
impl SpeechAnalyzer for RemoteAnalyzer {
    async fn analyze_speech(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> Result<Option<SpeechAnalysis>> {
        let Some(r) = self.call(session, media).await? else {
            return Ok(None);
        };
        Ok(r.distribution().map(|emotions| SpeechAnalysis {
            dominant_emotion: r.dominant(&emotions),
            emotions,
            duration_secs: r.duration_secs,
        }))
    }
}

#[async_trait]
impl TextAnalyzer for RemoteAnalyzer {
    async fn analyze_text(
        &self,
        session: &SessionId,
        media: &MediaRef,
    ) -> Result<Option<TextAnalysis>> {
        let Some(r) = self.call(session, media).await? else {
            return Ok(None);
        };
        Ok(r.distribution().map(|emotions| TextAnalysis {
            dominant_emotion: r.dominant(&emotions),
            emotions,
            transcript: r.transcript.clone().unwrap_or_default(),
        }))
    }
}
