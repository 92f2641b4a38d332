//! Deterministic analyzers for local runs and tests (`ANALYZER_MODE=fixture`).

use async_trait::async_trait;

use super::{SpeechAnalyzer, TextAnalyzer, VideoAnalyzer};
use crate::emotion::EmotionDistribution;
use crate::session::{MediaRef, SessionId, SpeechAnalysis, TextAnalysis, VideoAnalysis};

/// Returns the same analyses for every session, regardless of media.
#[derive(Debug, Clone)]
pub struct FixtureAnalyzer {
    pub video: VideoAnalysis,
    pub speech: SpeechAnalysis,
    pub text: TextAnalysis,
}

impl FixtureAnalyzer {
    pub fn new(video: VideoAnalysis, speech: SpeechAnalysis, text: TextAnalysis) -> Self {
        Self {
            video,
            speech,
            text,
        }
    }
}

impl Default for FixtureAnalyzer {
    /// Happy-leaning session: video {happy 80, neutral 20}, audio {happy 60,
    /// sad 40}, text {happy 50, neutral 50}.
    fn default() -> Self {
        Self {
            video: VideoAnalysis::new(EmotionDistribution::from_pairs([
                ("happy", 80.0),
                ("neutral", 20.0),
            ])),
            speech: SpeechAnalysis::new(EmotionDistribution::from_pairs([
                ("happy", 60.0),
                ("sad", 40.0),
            ]))
            .with_duration(12.0),
            text: TextAnalysis::new(
                EmotionDistribution::from_pairs([("happy", 50.0), ("neutral", 50.0)]),
                "fixture transcript",
            ),
        }
    }
}

#[async_trait]
impl VideoAnalyzer for FixtureAnalyzer {
    async fn analyze_video(
        &self,
        _session: &SessionId,
        _media: &MediaRef,
    ) -> anyhow::Result<Option<VideoAnalysis>> {
        Ok(Some(self.video.clone()))
    }
}

#[async_trait]
impl SpeechAnalyzer for FixtureAnalyzer {
    async fn analyze_speech(
        &self,
        _session: &SessionId,
        _media: &MediaRef,
    ) -> anyhow::Result<Option<SpeechAnalysis>> {
        Ok(Some(self.speech.clone()))
    }
}

#[async_trait]
impl TextAnalyzer for FixtureAnalyzer {
    async fn analyze_text(
        &self,
        _session: &SessionId,
        _media: &MediaRef,
    ) -> anyhow::Result<Option<TextAnalysis>> {
        Ok(Some(self.text.clone()))
    }
}
