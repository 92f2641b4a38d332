// tests/config_load.rs
use emotion_fusion::config::{AnalyzerMode, AppConfig, ENV_CONFIG_PATH};
use std::path::PathBuf;
use std::{env, fs};

const OVERRIDE_KEYS: [&str; 5] = [
    "FUSION_WEIGHT_VIDEO",
    "FUSION_WEIGHT_AUDIO",
    "FUSION_WEIGHT_TEXT",
    "ANALYZER_MODE",
    "ARTIFACT_DIR",
];

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    for k in OVERRIDE_KEYS {
        env::remove_var(k);
    }
}

#[test]
fn parse_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("fusion.toml");
    fs::write(
        &p_toml,
        r#"
[weights]
video = 5
audio = 3
text = 2

[artifacts]
dir = "out"
cleanup_after = true
"#,
    )
    .unwrap();
    let t = AppConfig::load_from(&p_toml).unwrap();
    assert_eq!(t.weights.video, Some(5.0));
    assert!(t.artifacts.cleanup_after);

    let engine = t.fusion_engine().unwrap();
    let w = engine.weights().to_config();
    assert!((w.video.unwrap() - 0.5).abs() < 1e-12);
    assert!((w.text.unwrap() - 0.2).abs() < 1e-12);

    let p_json = dir.path().join("fusion.json");
    fs::write(&p_json, r#"{"analyzers": {"mode": "fixture", "timeout_secs": 5}}"#).unwrap();
    let j = AppConfig::load_from(&p_json).unwrap();
    assert_eq!(j.analyzers.timeout_secs, 5);
    assert!(j.weights.is_unset());

    let p_bad = dir.path().join("broken.toml");
    fs::write(&p_bad, "[weights\nvideo = ").unwrap();
    let err = AppConfig::load_from(&p_bad).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not read.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing → defaults
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg, AppConfig::default());

    // 2) config/fusion.toml fallback
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("fusion.toml"), "[weights]\nvideo = 1.0\n").unwrap();
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.weights.video, Some(1.0));
    assert_eq!(cfg.weights.audio, None);

    // 3) env path wins
    let p_env = tmp.path().join("custom.json");
    fs::write(&p_env, r#"{"artifacts": {"dir": "elsewhere"}}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, &p_env);
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.artifacts.dir, PathBuf::from("elsewhere"));
    assert!(cfg.weights.is_unset());

    // 4) env path pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(AppConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top_of_file() {
    let tmp = tempfile::tempdir().unwrap();
    clear_env();

    let p = tmp.path().join("fusion.toml");
    fs::write(&p, "[weights]\nvideo = 0.4\naudio = 0.3\ntext = 0.3\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, &p);
    env::set_var("FUSION_WEIGHT_TEXT", "0.0");
    env::set_var("ANALYZER_MODE", "fixture");

    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.weights.text, Some(0.0));
    assert_eq!(cfg.analyzers.mode, AnalyzerMode::Fixture);

    let w = cfg.fusion_engine().unwrap().weights().to_config();
    assert!((w.video.unwrap() - 0.4 / 0.7).abs() < 1e-12);
    assert_eq!(w.text, Some(0.0));

    env::set_var("ANALYZER_MODE", "quantum");
    assert!(AppConfig::load_default().is_err());

    clear_env();
}
