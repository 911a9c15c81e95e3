use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TARGET_FPS: u32 = 8;
const DEFAULT_ANALYSIS_MAX_DIM: u32 = 1024;
const DEFAULT_REQUIRED_STABLE_FRAMES: u32 = 3;
const DEFAULT_MAX_CORNER_MOVEMENT_PX: f32 = 8.0;
const DEFAULT_CAPTURE_COOLDOWN_MS: u64 = 1500;

#[derive(Debug, Deserialize, Default)]
struct LivescanConfigFile {
    target_fps: Option<u32>,
    analysis_max_dim: Option<u32>,
    required_stable_frames: Option<u32>,
    max_corner_movement_px: Option<f32>,
    capture_cooldown_ms: Option<u64>,
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct LivescanConfig {
    /// Analysis throttle: how many frames per second enter the chain.
    pub target_fps: u32,
    /// Larger dimension bound for the analysis copy.
    pub analysis_max_dim: u32,
    /// Consecutive similar detections required before auto-capture.
    pub required_stable_frames: u32,
    /// Largest per-corner movement (px) still considered the same pose.
    pub max_corner_movement_px: f32,
    /// Minimum elapsed time between two accepted captures.
    pub capture_cooldown_ms: u64,
}

impl Default for LivescanConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            analysis_max_dim: DEFAULT_ANALYSIS_MAX_DIM,
            required_stable_frames: DEFAULT_REQUIRED_STABLE_FRAMES,
            max_corner_movement_px: DEFAULT_MAX_CORNER_MOVEMENT_PX,
            capture_cooldown_ms: DEFAULT_CAPTURE_COOLDOWN_MS,
        }
    }
}

impl LivescanConfig {
    /// Load from the JSON file named by `LIVESCAN_CONFIG` (if set), apply
    /// `LIVESCAN_*` env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LIVESCAN_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LivescanConfigFile) -> Self {
        Self {
            target_fps: file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            analysis_max_dim: file.analysis_max_dim.unwrap_or(DEFAULT_ANALYSIS_MAX_DIM),
            required_stable_frames: file
                .required_stable_frames
                .unwrap_or(DEFAULT_REQUIRED_STABLE_FRAMES),
            max_corner_movement_px: file
                .max_corner_movement_px
                .unwrap_or(DEFAULT_MAX_CORNER_MOVEMENT_PX),
            capture_cooldown_ms: file
                .capture_cooldown_ms
                .unwrap_or(DEFAULT_CAPTURE_COOLDOWN_MS),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(fps) = std::env::var("LIVESCAN_TARGET_FPS") {
            self.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("LIVESCAN_TARGET_FPS must be an integer"))?;
        }
        if let Ok(dim) = std::env::var("LIVESCAN_ANALYSIS_MAX_DIM") {
            self.analysis_max_dim = dim
                .parse()
                .map_err(|_| anyhow!("LIVESCAN_ANALYSIS_MAX_DIM must be an integer"))?;
        }
        if let Ok(frames) = std::env::var("LIVESCAN_REQUIRED_STABLE_FRAMES") {
            self.required_stable_frames = frames
                .parse()
                .map_err(|_| anyhow!("LIVESCAN_REQUIRED_STABLE_FRAMES must be an integer"))?;
        }
        if let Ok(movement) = std::env::var("LIVESCAN_MAX_CORNER_MOVEMENT_PX") {
            self.max_corner_movement_px = movement
                .parse()
                .map_err(|_| anyhow!("LIVESCAN_MAX_CORNER_MOVEMENT_PX must be a number"))?;
        }
        if let Ok(cooldown) = std::env::var("LIVESCAN_CAPTURE_COOLDOWN_MS") {
            self.capture_cooldown_ms = cooldown
                .parse()
                .map_err(|_| anyhow!("LIVESCAN_CAPTURE_COOLDOWN_MS must be an integer number of milliseconds"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.target_fps == 0 {
            return Err(anyhow!("target_fps must be at least 1"));
        }
        if self.analysis_max_dim < 32 {
            return Err(anyhow!("analysis_max_dim must be at least 32"));
        }
        if self.required_stable_frames == 0 {
            return Err(anyhow!("required_stable_frames must be at least 1"));
        }
        if self.max_corner_movement_px <= 0.0 {
            return Err(anyhow!("max_corner_movement_px must be positive"));
        }
        if self.capture_cooldown_ms == 0 {
            return Err(anyhow!("capture_cooldown_ms must be at least 1"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<LivescanConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
