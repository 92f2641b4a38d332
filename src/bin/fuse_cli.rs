//! Offline fusion of three distributions from a JSON file.
//!
//! ```text
//! fuse_cli session.json
//! {"weights": {"video": 0.5, "audio": 0.3, "text": 0.2},
//!  "video": {"happy": 80, "neutral": 20},
//!  "audio": {"happy": 60, "sad": 40},
//!  "text":  {"happy": 50, "neutral": 50}}
//! ```

use anyhow::{bail, Context, Result};
use emotion_fusion::{EmotionDistribution, FusionEngine, WeightsConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CliInput {
    #[serde(default)]
    weights: Option<WeightsConfig>,
    #[serde(default)]
    video: Option<EmotionDistribution>,
    #[serde(default)]
    audio: Option<EmotionDistribution>,
    #[serde(default)]
    text: Option<EmotionDistribution>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: fuse_cli <input.json>");
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let input: CliInput = serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let engine = FusionEngine::new(input.weights)?;
    let result = engine.fuse(input.video.as_ref(), input.audio.as_ref(), input.text.as_ref())?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
