//! # Emotion Distribution
//!
//! The common currency between analyzers, the fusion engine and the report:
//! a score for each of the seven fixed emotion labels.
//!
//! - All seven labels are always present (missing source values are 0.0).
//! - Scores are non-negative; they are not required to sum to 100.
//! - Values are immutable once built. Equal values mean equal distributions.
//!
//! Model-native labels (`joy`, `anger`, `sadness`, ...) are folded into the
//! canonical set on the way in; labels outside it are dropped.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of labels. Fixed; the confidence estimator depends on it.
pub const LABEL_COUNT: usize = 7;

/// Closed label set, in tie-break order (lowest index wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; LABEL_COUNT] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    /// Case-insensitive parse of canonical labels and common model aliases.
    pub fn parse(label: &str) -> Option<Emotion> {
        match label.trim().to_ascii_lowercase().as_str() {
            "angry" | "anger" => Some(Emotion::Angry),
            "disgust" | "disgusted" => Some(Emotion::Disgust),
            "fear" | "fearful" => Some(Emotion::Fear),
            "happy" | "joy" => Some(Emotion::Happy),
            "sad" | "sadness" => Some(Emotion::Sad),
            "surprise" | "surprised" => Some(Emotion::Surprise),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for the seven labels, indexed by `Emotion::index`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionDistribution {
    scores: [f64; LABEL_COUNT],
}

impl EmotionDistribution {
    /// All-zero distribution (equivalent to an absent modality in fusion).
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from raw scores in label order. Negative or non-finite values become 0.0.
    pub fn from_scores(scores: [f64; LABEL_COUNT]) -> Self {
        let mut out = [0.0; LABEL_COUNT];
        for (dst, src) in out.iter_mut().zip(scores) {
            *dst = sanitize(src);
        }
        Self { scores: out }
    }

    /// Build from `(label, score)` pairs. Unknown labels are ignored, later
    /// duplicates overwrite earlier ones, missing labels stay 0.0.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut scores = [0.0; LABEL_COUNT];
        for (label, value) in pairs {
            if let Some(e) = Emotion::parse(label.as_ref()) {
                scores[e.index()] = sanitize(value);
            }
        }
        Self { scores }
    }

    /// Classifier predictions as probabilities in [0,1] → percentages.
    pub fn from_predictions<I, K>(predictions: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Self::from_pairs(
            predictions
                .into_iter()
                .map(|(label, p)| (label, sanitize(p) * 100.0)),
        )
    }

    /// A classifier that only reports its top label: `score*100` on that label,
    /// the remainder spread evenly across the other six.
    pub fn from_top_label(label: Emotion, score: f64) -> Self {
        let top = sanitize(score).min(1.0) * 100.0;
        let rest = (100.0 - top) / (LABEL_COUNT - 1) as f64;
        let mut scores = [rest; LABEL_COUNT];
        scores[label.index()] = top;
        Self { scores }
    }

    /// Builder-style copy with one label replaced.
    pub fn with(mut self, label: Emotion, value: f64) -> Self {
        self.scores[label.index()] = sanitize(value);
        self
    }

    /// Per-label mean over a timeline of frame distributions. `None` if empty.
    pub fn average(frames: &[EmotionDistribution]) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        let mut acc = [0.0; LABEL_COUNT];
        for f in frames {
            for (a, v) in acc.iter_mut().zip(f.scores.iter()) {
                *a += v;
            }
        }
        let n = frames.len() as f64;
        for a in acc.iter_mut() {
            *a /= n;
        }
        Some(Self { scores: acc })
    }

    #[inline]
    pub fn get(&self, label: Emotion) -> f64 {
        self.scores[label.index()]
    }

    pub fn scores(&self) -> &[f64; LABEL_COUNT] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.scores[e.index()]))
    }

    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// True when every score is zero (no usable signal).
    pub fn is_empty(&self) -> bool {
        self.scores.iter().all(|&v| v == 0.0)
    }

    /// Highest-scoring label; ties go to the earliest label in `Emotion::ALL`.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::ALL[0];
        for &e in Emotion::ALL.iter().skip(1) {
            if self.scores[e.index()] > self.scores[best.index()] {
                best = e;
            }
        }
        best
    }

    /// Probability vector (each score / total). `None` for an empty distribution.
    ///
    /// Scores are scaled by the largest one first so the sum cannot overflow.
    pub fn probabilities(&self) -> Option<[f64; LABEL_COUNT]> {
        let max = self.scores.iter().copied().fold(0.0, f64::max);
        if !(max > 0.0) {
            return None;
        }
        let mut p = self.scores.map(|v| v / max);
        let total: f64 = p.iter().sum();
        for v in p.iter_mut() {
            *v /= total;
        }
        Some(p)
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// Serialized as a label → score map in fixed label order.
impl Serialize for EmotionDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LABEL_COUNT))?;
        for (e, v) in self.iter() {
            map.serialize_entry(e.as_str(), &v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EmotionDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, f64>::deserialize(deserializer)?;
        Ok(Self::from_pairs(raw))
    }
}
