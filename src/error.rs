//! Error taxonomy shared by the fusion engine and the session orchestrator.
//!
//! Stage-local failures surface as `SessionError`; the orchestrator folds them
//! into a single failed `SessionReport` so front ends render one shape.
//! Visualization failures are the only ones recovered locally.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Video,
    Speech,
    Text,
    Fusion,
    Visualization,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Video => "video",
            Stage::Speech => "speech",
            Stage::Text => "text",
            Stage::Fusion => "fusion",
            Stage::Visualization => "visualization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// An external analyzer returned no usable distribution. Never retried.
    #[error("{stage} analyzer failed: {reason}")]
    AnalyzerFailure { stage: Stage, reason: String },

    /// Invalid modality weights (negative, non-finite, zero sum, missing key).
    #[error("invalid modality weights: {0}")]
    Configuration(String),

    /// Nothing to fuse.
    #[error("fusion failed: {0}")]
    Fusion(String),

    /// Chart rendering failed; logged and attached to an otherwise valid report.
    #[error("visualization failed: {0}")]
    Visualization(String),
}

impl SessionError {
    pub fn analyzer(stage: Stage, reason: impl Into<String>) -> Self {
        SessionError::AnalyzerFailure {
            stage,
            reason: reason.into(),
        }
    }

    /// Stage the failure belongs to, for reporting.
    pub fn stage(&self) -> Stage {
        match self {
            SessionError::AnalyzerFailure { stage, .. } => *stage,
            SessionError::Configuration(_) | SessionError::Fusion(_) => Stage::Fusion,
            SessionError::Visualization(_) => Stage::Visualization,
        }
    }
}
