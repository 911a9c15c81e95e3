//! livescan_demo - run the capture pipeline against a synthetic sensor
//!
//! This demo:
//! 1. Spawns a producer thread emitting synthetic frames at sensor rate
//! 2. Delivers them through the keep-only-latest slot (backpressure)
//! 3. Runs the analysis pipeline with a scripted mock detector
//! 4. Logs overlay updates, captures, and periodic health stats

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use livescan::{
    CaptureSink, DetectorBackend, LatestFrameSlot, LivescanConfig, MockDetector, OverlaySink,
    Pipeline, PipelineError, Point,
};
use livescan::detect::MockOutcome;
use livescan::source::{SyntheticConfig, SyntheticSource};

struct LogOverlay;

impl OverlaySink for LogOverlay {
    fn set_corners(&self, points: &[Point]) {
        log::debug!(
            "overlay: corners ({:.0},{:.0}) ({:.0},{:.0}) ({:.0},{:.0}) ({:.0},{:.0})",
            points[0].x,
            points[0].y,
            points[1].x,
            points[1].y,
            points[2].x,
            points[2].y,
            points[3].x,
            points[3].y,
        );
    }

    fn clear(&self) {
        log::debug!("overlay: cleared");
    }
}

struct DemoCaptureSink {
    counter: AtomicU64,
}

impl CaptureSink for DemoCaptureSink {
    fn capture(&self) -> Result<PathBuf, PipelineError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(std::env::temp_dir().join(format!("livescan_page_{:04}.jpg", n)))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = LivescanConfig::load()?;
    log::info!(
        "livescan_demo: fps={} max_dim={} stable_frames={} movement={}px cooldown={}ms",
        cfg.target_fps,
        cfg.analysis_max_dim,
        cfg.required_stable_frames,
        cfg.max_corner_movement_px,
        cfg.capture_cooldown_ms
    );

    // Scripted detector: nothing in view at first, then a page settles and
    // holds (the mock repeats its last outcome once the script runs out).
    let mut detector = MockDetector::new();
    for _ in 0..16 {
        detector.push_outcome(MockOutcome::NoCorners);
    }
    detector.hold_pose(
        [
            Point::new(160.0, 120.0),
            Point::new(480.0, 120.0),
            Point::new(480.0, 360.0),
            Point::new(160.0, 360.0),
        ],
        1,
    );

    let mut pipeline = Pipeline::new(
        &cfg,
        DetectorBackend::Mock(detector),
        Arc::new(LogOverlay),
        Arc::new(DemoCaptureSink {
            counter: AtomicU64::new(0),
        }),
    );
    pipeline.set_view_target(1080, 1920, 90);

    // Producer at full sensor rate; the slot drops what analysis can't keep
    // up with.
    let slot = Arc::new(LatestFrameSlot::new());
    let producer_slot = slot.clone();
    std::thread::spawn(move || {
        let mut source = SyntheticSource::new(SyntheticConfig {
            width: 640,
            height: 480,
            rotation_degrees: 90,
            row_padding: 64,
            fps: 30,
        });
        loop {
            producer_slot.offer(source.next_frame());
            std::thread::sleep(Duration::from_millis(33));
        }
    });

    let mut last_health_log = Instant::now();
    loop {
        if let Some(frame) = slot.take() {
            pipeline.process_frame(frame);
        } else {
            std::thread::sleep(Duration::from_millis(5));
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = pipeline.stats();
            log::info!(
                "health: seen={} analyzed={} gated={} conv_fail={} det_fail={} captures={} dropped={}",
                stats.frames_seen,
                stats.frames_analyzed,
                stats.frames_gated,
                stats.conversion_failures,
                stats.detector_failures,
                stats.captures_triggered,
                slot.frames_dropped()
            );
            last_health_log = Instant::now();
        }
    }
}
