//! Service configuration: modality weights, analyzer wiring, artifact storage.
//!
//! Resolution order:
//! 1) `$FUSION_CONFIG_PATH` (TOML or JSON by extension; must exist)
//! 2) `config/fusion.toml`
//! 3) `config/fusion.json`
//! 4) built-in defaults
//!
//! Env overrides are applied last: `FUSION_WEIGHT_VIDEO`, `FUSION_WEIGHT_AUDIO`,
//! `FUSION_WEIGHT_TEXT`, `ANALYZER_MODE`, `ARTIFACT_DIR`.
//!
//! ```toml
//! [weights]
//! video = 0.4
//! audio = 0.3
//! text = 0.3
//!
//! [analyzers]
//! mode = "remote"
//! video_url = "http://127.0.0.1:9001/video"
//! speech_url = "http://127.0.0.1:9002/speech"
//! text_url = "http://127.0.0.1:9003/text"
//! timeout_secs = 120
//!
//! [artifacts]
//! dir = "artifacts"
//! cleanup_after = true
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::analyzers::{AnalyzerSet, RemoteAnalyzer};
use crate::fusion::FusionEngine;
use crate::orchestrator::SessionOrchestrator;
use crate::visualize::SvgChartVisualizer;
use crate::weights::WeightsConfig;

pub const ENV_CONFIG_PATH: &str = "FUSION_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/fusion.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/fusion.json";

fn default_timeout_secs() -> u64 {
    60
}
fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerMode {
    #[default]
    Fixture,
    Remote,
}

impl AnalyzerMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixture" | "mock" => Some(Self::Fixture),
            "remote" | "http" => Some(Self::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzersConfig {
    #[serde(default)]
    pub mode: AnalyzerMode,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub speech_url: Option<String>,
    #[serde(default)]
    pub text_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            mode: AnalyzerMode::default(),
            video_url: None,
            speech_url: None,
            text_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
    /// Remove a failed session's workspace.
    #[serde(default)]
    pub cleanup_after: bool,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            cleanup_after: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Unset keys fall back to the default policy only when *all* are unset.
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub analyzers: AnalyzersConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

impl AppConfig {
    /// Load from an explicit path. Format follows the extension (`.json` or TOML).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parsed = if ext == "json" {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        parsed.with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Env path, then the default files, then defaults; env overrides on top.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_CONFIG_TOML).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_TOML))?
        } else if Path::new(DEFAULT_CONFIG_JSON).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_JSON))?
        } else {
            Self::default()
        };
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply overrides from a key lookup (env in production, a map in tests).
    pub fn apply_overrides<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let weight = |key: &str| -> Result<Option<f64>> {
            match get(key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| anyhow!("{key} is not a number: {raw:?}")),
            }
        };
        if let Some(w) = weight("FUSION_WEIGHT_VIDEO")? {
            self.weights.video = Some(w);
        }
        if let Some(w) = weight("FUSION_WEIGHT_AUDIO")? {
            self.weights.audio = Some(w);
        }
        if let Some(w) = weight("FUSION_WEIGHT_TEXT")? {
            self.weights.text = Some(w);
        }
        if let Some(raw) = get("ANALYZER_MODE") {
            self.analyzers.mode = AnalyzerMode::parse(&raw)
                .ok_or_else(|| anyhow!("unsupported ANALYZER_MODE: {raw:?}"))?;
        }
        if let Some(dir) = get("ARTIFACT_DIR").filter(|d| !d.trim().is_empty()) {
            self.artifacts.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn fusion_engine(&self) -> Result<FusionEngine> {
        let weights = (!self.weights.is_unset()).then_some(self.weights);
        Ok(FusionEngine::new(weights)?)
    }

    pub fn analyzer_set(&self) -> Result<AnalyzerSet> {
        match self.analyzers.mode {
            AnalyzerMode::Fixture => Ok(AnalyzerSet::fixture()),
            AnalyzerMode::Remote => {
                let timeout = Duration::from_secs(self.analyzers.timeout_secs.max(1));
                let remote = |name: &str, url: &Option<String>| -> Result<Arc<RemoteAnalyzer>> {
                    let url = url
                        .as_deref()
                        .filter(|u| !u.trim().is_empty())
                        .ok_or_else(|| anyhow!("analyzers.{name}_url is required in remote mode"))?;
                    Ok(Arc::new(RemoteAnalyzer::new(url, timeout)?))
                };
                Ok(AnalyzerSet {
                    video: remote("video", &self.analyzers.video_url)?,
                    speech: remote("speech", &self.analyzers.speech_url)?,
                    text: remote("text", &self.analyzers.text_url)?,
                })
            }
        }
    }

    /// Wire the full pipeline described by this config.
    pub fn build_orchestrator(&self) -> Result<SessionOrchestrator> {
        let engine = self.fusion_engine()?;
        let analyzers = self.analyzer_set()?;
        info!(
            mode = ?self.analyzers.mode,
            artifacts = %self.artifacts.dir.display(),
            weights = ?engine.weights().to_config(),
            "pipeline configured"
        );
        Ok(SessionOrchestrator::new(
            analyzers,
            Arc::new(SvgChartVisualizer::new()),
            engine,
            self.artifacts.dir.clone(),
        )
        .with_cleanup_on_failure(self.artifacts.cleanup_after))
    }
}
