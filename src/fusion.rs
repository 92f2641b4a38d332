//! # Fusion Engine
//! Pure, synchronous logic that maps `(video, audio, text)` → `FusionResult`.
//! No I/O, no shared mutable state; one engine can serve many sessions.
//!
//! Policy: each label's fused score is `Σ weight[m] * distribution_m[label]`
//! over present modalities. Absent (or all-zero) modalities contribute zero
//! and their weight is *not* redistributed to the others. The dominant label
//! is the fused maximum, ties broken by label order. Confidence is reported
//! per modality from its raw distribution, not from the fused one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confidence::confidence;
use crate::emotion::{Emotion, EmotionDistribution, LABEL_COUNT};
use crate::error::SessionError;
use crate::weights::{Modality, ModalityWeights, WeightsConfig};

/// One confidence score in [0, 100] per modality (0.0 for absent ones).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalityConfidence {
    pub video: f64,
    pub audio: f64,
    pub text: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub fused: EmotionDistribution,
    pub dominant_emotion: Emotion,
    pub confidence: ModalityConfidence,
}

#[derive(Debug, Clone)]
pub struct FusionEngine {
    weights: ModalityWeights,
}

impl FusionEngine {
    /// `None` selects the documented default policy (see `weights`).
    pub fn new(weights: Option<WeightsConfig>) -> Result<Self, SessionError> {
        let weights = match weights {
            Some(cfg) => ModalityWeights::from_config(&cfg)?,
            None => ModalityWeights::default_policy(),
        };
        Ok(Self { weights })
    }

    pub fn with_weights(weights: ModalityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ModalityWeights {
        &self.weights
    }

    /// Fuse up to three distributions.
    ///
    /// Errors:
    /// - `Fusion` when every input is absent or all-zero.
    /// - `Configuration` when a modality with data has no configured weight.
    pub fn fuse(
        &self,
        video: Option<&EmotionDistribution>,
        audio: Option<&EmotionDistribution>,
        text: Option<&EmotionDistribution>,
    ) -> Result<FusionResult, SessionError> {
        let inputs = [video, audio, text];

        let present: Vec<(Modality, &EmotionDistribution)> = Modality::ALL
            .iter()
            .zip(inputs)
            .filter_map(|(&m, d)| d.filter(|d| !d.is_empty()).map(|d| (m, d)))
            .collect();

        if present.is_empty() {
            return Err(SessionError::Fusion(
                "all modality distributions are absent or empty".to_string(),
            ));
        }

        let mut fused = [0.0; LABEL_COUNT];
        for (m, dist) in &present {
            let w = self.weights.get(*m).ok_or_else(|| {
                SessionError::Configuration(format!("no weight configured for {m}"))
            })?;
            for (acc, v) in fused.iter_mut().zip(dist.scores().iter()) {
                *acc += w * v;
            }
        }
        let fused = EmotionDistribution::from_scores(fused);
        let dominant_emotion = fused.dominant();

        let conf = |d: Option<&EmotionDistribution>| d.map(confidence).unwrap_or(0.0);
        let confidence = ModalityConfidence {
            video: conf(video),
            audio: conf(audio),
            text: conf(text),
        };

        debug!(
            target: "fusion",
            modalities = present.len(),
            dominant = %dominant_emotion,
            score = fused.get(dominant_emotion),
            "fused distributions"
        );

        Ok(FusionResult {
            fused,
            dominant_emotion,
            confidence,
        })
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::with_weights(ModalityWeights::default_policy())
    }
}
