use std::sync::Mutex;

use tempfile::NamedTempFile;

use livescan::LivescanConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LIVESCAN_CONFIG",
        "LIVESCAN_TARGET_FPS",
        "LIVESCAN_ANALYSIS_MAX_DIM",
        "LIVESCAN_REQUIRED_STABLE_FRAMES",
        "LIVESCAN_MAX_CORNER_MOVEMENT_PX",
        "LIVESCAN_CAPTURE_COOLDOWN_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "target_fps": 12,
        "analysis_max_dim": 800,
        "required_stable_frames": 4,
        "max_corner_movement_px": 6.5,
        "capture_cooldown_ms": 2000
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("LIVESCAN_CONFIG", file.path());
    std::env::set_var("LIVESCAN_TARGET_FPS", "10");

    let cfg = LivescanConfig::load().expect("load config");

    assert_eq!(cfg.target_fps, 10); // env wins over file
    assert_eq!(cfg.analysis_max_dim, 800);
    assert_eq!(cfg.required_stable_frames, 4);
    assert_eq!(cfg.max_corner_movement_px, 6.5);
    assert_eq!(cfg.capture_cooldown_ms, 2000);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LivescanConfig::load().expect("load defaults");
    assert_eq!(cfg.target_fps, 8);
    assert_eq!(cfg.analysis_max_dim, 1024);
    assert_eq!(cfg.required_stable_frames, 3);
    assert_eq!(cfg.capture_cooldown_ms, 1500);

    clear_env();
}

#[test]
fn invalid_env_value_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LIVESCAN_TARGET_FPS", "fast");
    assert!(LivescanConfig::load().is_err());

    clear_env();
}
