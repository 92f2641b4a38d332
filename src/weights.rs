//! # Modality Weights
//!
//! Per-modality trust weights used by the fusion engine.
//!
//! - Weights are non-negative and sum to 1.0 after construction; inputs that
//!   do not are rescaled proportionally.
//! - A mapping may omit a modality. That is only an error if the omitted
//!   modality later shows up with non-empty data (checked by the engine).
//! - Immutable once built; re-weighting means building a new engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;

/// Default policy: video 0.4, audio 0.3, text 0.3.
pub const DEFAULT_VIDEO_WEIGHT: f64 = 0.4;
pub const DEFAULT_AUDIO_WEIGHT: f64 = 0.3;
pub const DEFAULT_TEXT_WEIGHT: f64 = 0.3;

/// Sums closer than this to 1.0 are left untouched.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Video,
    Audio,
    Text,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Video, Modality::Audio, Modality::Text];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Video => "video",
            Modality::Audio => "audio",
            Modality::Text => "text",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, possibly partial weights as they appear in config files or requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<f64>,
}

impl WeightsConfig {
    pub fn is_unset(&self) -> bool {
        self.video.is_none() && self.audio.is_none() && self.text.is_none()
    }

    fn as_array(&self) -> [Option<f64>; 3] {
        [self.video, self.audio, self.text]
    }
}

/// Normalized weights. Missing modalities stay `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalityWeights {
    weights: [Option<f64>; 3],
}

impl ModalityWeights {
    /// Full mapping; rescaled if it does not sum to 1.0.
    pub fn new(video: f64, audio: f64, text: f64) -> Result<Self, SessionError> {
        Self::from_config(&WeightsConfig {
            video: Some(video),
            audio: Some(audio),
            text: Some(text),
        })
    }

    /// Possibly partial mapping. Fails on negative/non-finite values or a zero sum.
    pub fn from_config(cfg: &WeightsConfig) -> Result<Self, SessionError> {
        let raw = cfg.as_array();

        for (m, w) in Modality::ALL.iter().zip(raw.iter()) {
            if let Some(w) = w {
                if !w.is_finite() {
                    return Err(SessionError::Configuration(format!(
                        "{m} weight is not a finite number"
                    )));
                }
                if *w < 0.0 {
                    return Err(SessionError::Configuration(format!(
                        "{m} weight is negative ({w})"
                    )));
                }
            }
        }

        if raw.iter().all(Option::is_none) {
            return Err(SessionError::Configuration(
                "no modality weights supplied".to_string(),
            ));
        }

        let sum: f64 = raw.iter().flatten().sum();
        if sum <= 0.0 {
            return Err(SessionError::Configuration(
                "weights sum to zero and cannot be normalized".to_string(),
            ));
        }

        let weights = if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            raw.map(|w| w.map(|w| w / sum))
        } else {
            raw
        };

        Ok(Self { weights })
    }

    /// Documented default policy (40/30/30).
    pub fn default_policy() -> Self {
        Self {
            weights: [
                Some(DEFAULT_VIDEO_WEIGHT),
                Some(DEFAULT_AUDIO_WEIGHT),
                Some(DEFAULT_TEXT_WEIGHT),
            ],
        }
    }

    pub fn get(&self, modality: Modality) -> Option<f64> {
        self.weights[modality.index()]
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().flatten().sum()
    }

    pub fn to_config(&self) -> WeightsConfig {
        WeightsConfig {
            video: self.weights[0],
            audio: self.weights[1],
            text: self.weights[2],
        }
    }
}

impl Default for ModalityWeights {
    fn default() -> Self {
        Self::default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_sums_to_one() {
        let w = ModalityWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert_eq!(w.get(Modality::Video), Some(0.4));
    }

    #[test]
    fn rescales_preserving_ratios() {
        let w = ModalityWeights::new(2.0, 1.0, 1.0).unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!((w.get(Modality::Video).unwrap() - 0.5).abs() < 1e-12);
        assert!((w.get(Modality::Text).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn exact_unit_sum_is_untouched() {
        let w = ModalityWeights::new(0.5, 0.3, 0.2).unwrap();
        assert_eq!(w.get(Modality::Video), Some(0.5));
        assert_eq!(w.get(Modality::Audio), Some(0.3));
        assert_eq!(w.get(Modality::Text), Some(0.2));
    }

    #[test]
    fn negative_weight_rejected() {
        let err = ModalityWeights::new(0.5, -0.1, 0.6).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn zero_sum_rejected() {
        assert!(ModalityWeights::new(0.0, 0.0, 0.0).is_err());
        assert!(ModalityWeights::from_config(&WeightsConfig::default()).is_err());
    }

    #[test]
    fn partial_mapping_normalizes_over_present_keys() {
        let w = ModalityWeights::from_config(&WeightsConfig {
            video: Some(3.0),
            audio: Some(1.0),
            text: None,
        })
        .unwrap();
        assert_eq!(w.get(Modality::Text), None);
        assert!((w.get(Modality::Video).unwrap() - 0.75).abs() < 1e-12);
    }
}
