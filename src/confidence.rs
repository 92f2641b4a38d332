//! # Confidence Estimator
//! Entropy-based confidence for one modality's distribution.
//!
//! `confidence = (1 - H/H_max) * 100`, where `H` is the base-2 Shannon entropy
//! of the normalized distribution and `H_max = log2(7)`. A one-hot distribution
//! scores 100, a uniform one scores 0. Empty (all-zero) distributions score
//! exactly 0.0.

use crate::emotion::{EmotionDistribution, LABEL_COUNT};

/// Confidence score in [0, 100]. Pure; safe to call from any thread.
pub fn confidence(distribution: &EmotionDistribution) -> f64 {
    let Some(p) = distribution.probabilities() else {
        return 0.0;
    };

    let h: f64 = p
        .iter()
        .filter(|&&pi| pi > 0.0)
        .map(|&pi| -pi * pi.log2())
        .sum();
    let h_max = (LABEL_COUNT as f64).log2();

    ((1.0 - h / h_max) * 100.0).clamp(0.0, 100.0)
}
