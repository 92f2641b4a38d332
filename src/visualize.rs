//! SVG chart of a session: per-modality bars on top, fused bars below with
//! the dominant label highlighted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::analyzers::{ChartInput, Visualizer};
use crate::emotion::{Emotion, EmotionDistribution, LABEL_COUNT};

const WIDTH: f64 = 960.0;
const PANEL_HEIGHT: f64 = 240.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const TOP_PANEL_Y: f64 = 50.0;
const BOTTOM_PANEL_Y: f64 = 360.0;
const HEIGHT: f64 = 660.0;

const VIDEO_COLOR: &str = "#FF9999";
const AUDIO_COLOR: &str = "#99FF99";
const TEXT_COLOR: &str = "#9999FF";
const FUSED_COLOR: &str = "#FFB266";
const DOMINANT_COLOR: &str = "#FF3333";

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartVisualizer;

impl SvgChartVisualizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Visualizer for SvgChartVisualizer {
    async fn render(&self, input: ChartInput<'_>, out: &Path) -> Result<PathBuf> {
        let svg = render_svg(&input);
        if let Some(parent) = out.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(out, svg)
            .await
            .with_context(|| format!("writing chart {}", out.display()))?;
        Ok(out.to_path_buf())
    }
}

/// Pure rendering; no I/O.
pub fn render_svg(input: &ChartInput<'_>) -> String {
    let series = [
        ("Video", VIDEO_COLOR, &input.video.emotions),
        ("Audio", AUDIO_COLOR, &input.speech.emotions),
        ("Text", TEXT_COLOR, &input.text.emotions),
    ];
    let fused = &input.fusion.fused;
    let dominant = input.fusion.dominant_emotion;

    let mut svg = String::with_capacity(16 * 1024);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = write!(svg, r##"<rect width="100%" height="100%" fill="#111111"/>"##);

    // Top panel: grouped bars per modality.
    let top_max = series
        .iter()
        .map(|(_, _, d)| max_score(d))
        .fold(0.0, f64::max);
    panel_frame(&mut svg, TOP_PANEL_Y, "Emotion Distribution by Modality");
    let slot = slot_width();
    let bar_w = slot * 0.25;
    for (s, (name, color, dist)) in series.iter().enumerate() {
        for e in Emotion::ALL {
            let x = slot_x(e) + slot * 0.125 + bar_w * s as f64;
            bar(&mut svg, x, bar_w, dist.get(e), top_max, TOP_PANEL_Y, color);
        }
        let lx = WIDTH - MARGIN_RIGHT - 90.0;
        let ly = TOP_PANEL_Y + 14.0 + 16.0 * s as f64;
        let _ = write!(
            svg,
            r##"<rect x="{lx}" y="{}" width="10" height="10" fill="{color}"/><text x="{}" y="{ly}" fill="#dddddd" font-size="11">{name}</text>"##,
            ly - 9.0,
            lx + 14.0
        );
    }
    axis_labels(&mut svg, TOP_PANEL_Y);

    // Bottom panel: fused bars, dominant highlighted, values on top.
    let title = format!("Fused Emotions Analysis - Dominant: {}", capitalize(dominant.as_str()));
    panel_frame(&mut svg, BOTTOM_PANEL_Y, &title);
    let fused_max = max_score(fused);
    let fw = slot * 0.6;
    for e in Emotion::ALL {
        let x = slot_x(e) + (slot - fw) / 2.0;
        let color = if e == dominant { DOMINANT_COLOR } else { FUSED_COLOR };
        let v = fused.get(e);
        let top = bar(&mut svg, x, fw, v, fused_max, BOTTOM_PANEL_Y, color);
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" fill="#ffffff" font-size="11" text-anchor="middle">{v:.1}%</text>"##,
            x + fw / 2.0,
            top - 4.0
        );
    }
    axis_labels(&mut svg, BOTTOM_PANEL_Y);

    svg.push_str("</svg>");
    svg
}

fn slot_width() -> f64 {
    (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / LABEL_COUNT as f64
}

fn slot_x(e: Emotion) -> f64 {
    MARGIN_LEFT + slot_width() * e.index() as f64
}

fn max_score(d: &EmotionDistribution) -> f64 {
    d.scores().iter().copied().fold(0.0, f64::max)
}

/// Draws one bar and returns its top y coordinate.
fn bar(svg: &mut String, x: f64, w: f64, v: f64, max: f64, panel_y: f64, color: &str) -> f64 {
    let h = if max > 0.0 { v / max * (PANEL_HEIGHT - 30.0) } else { 0.0 };
    let y = panel_y + PANEL_HEIGHT - h;
    let _ = write!(
        svg,
        r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}"/>"#
    );
    y
}

fn panel_frame(svg: &mut String, panel_y: f64, title: &str) {
    let _ = write!(
        svg,
        r##"<text x="{}" y="{}" fill="#ffffff" font-size="15" text-anchor="middle">{title}</text>"##,
        WIDTH / 2.0,
        panel_y - 16.0
    );
    let base = panel_y + PANEL_HEIGHT;
    let _ = write!(
        svg,
        r##"<line x1="{MARGIN_LEFT}" y1="{base}" x2="{}" y2="{base}" stroke="#888888"/><line x1="{MARGIN_LEFT}" y1="{panel_y}" x2="{MARGIN_LEFT}" y2="{base}" stroke="#888888"/>"##,
        WIDTH - MARGIN_RIGHT
    );
    let _ = write!(
        svg,
        r##"<text x="16" y="{}" fill="#bbbbbb" font-size="11" transform="rotate(-90 16 {})">Confidence (%)</text>"##,
        panel_y + PANEL_HEIGHT / 2.0,
        panel_y + PANEL_HEIGHT / 2.0
    );
}

fn axis_labels(svg: &mut String, panel_y: f64) {
    let y = panel_y + PANEL_HEIGHT + 16.0;
    for e in Emotion::ALL {
        let x = slot_x(e) + slot_width() / 2.0;
        let _ = write!(
            svg,
            r##"<text x="{x:.2}" y="{y}" fill="#dddddd" font-size="12" text-anchor="middle">{}</text>"##,
            e.as_str()
        );
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(f) => f.to_uppercase().chain(c).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::FusionEngine;
    use crate::session::{SpeechAnalysis, TextAnalysis, VideoAnalysis};

    fn sample() -> (VideoAnalysis, SpeechAnalysis, TextAnalysis) {
        (
            VideoAnalysis::new(EmotionDistribution::from_pairs([("happy", 80.0), ("neutral", 20.0)])),
            SpeechAnalysis::new(EmotionDistribution::from_pairs([("happy", 60.0), ("sad", 40.0)])),
            TextAnalysis::new(
                EmotionDistribution::from_pairs([("happy", 50.0), ("neutral", 50.0)]),
                "",
            ),
        )
    }

    #[test]
    fn svg_contains_labels_and_highlight() {
        let (v, s, t) = sample();
        let fusion = FusionEngine::default()
            .fuse(Some(&v.emotions), Some(&s.emotions), Some(&t.emotions))
            .unwrap();
        let svg = render_svg(&ChartInput {
            video: &v,
            speech: &s,
            text: &t,
            fusion: &fusion,
        });
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Dominant: Happy"));
        assert!(svg.contains(DOMINANT_COLOR));
        for e in Emotion::ALL {
            assert!(svg.contains(&format!(">{}</text>", e.as_str())));
        }
    }

    #[tokio::test]
    async fn render_writes_file() {
        let (v, s, t) = sample();
        let fusion = FusionEngine::default()
            .fuse(Some(&v.emotions), Some(&s.emotions), Some(&t.emotions))
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("chart.svg");
        let path = SvgChartVisualizer::new()
            .render(
                ChartInput {
                    video: &v,
                    speech: &s,
                    text: &t,
                    fusion: &fusion,
                },
                &out,
            )
            .await
            .unwrap();
        assert_eq!(path, out);
        let body = std::fs::read_to_string(&out).unwrap();
        assert!(body.contains("Fused Emotions Analysis"));
    }
}
