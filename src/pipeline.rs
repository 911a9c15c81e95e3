//! Per-frame pipeline orchestration.
//!
//! [`Pipeline::process_frame`] runs the whole analysis chain for one frame:
//! gate, convert, downscale, detect, track stability, map coordinates, and
//! decide on auto-capture. The incoming [`SensorFrame`] is owned by the call
//! for its full duration; its release hook fires at scope exit on every
//! path, including early skips and failures.
//!
//! Nothing propagates out of a frame pass: conversion failures are logged
//! and the frame skipped, detector failures and panics read as "no
//! corners". The camera stream never sees an error from this module.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use crate::detect::DetectorBackend;
use crate::downscale::downscale;
use crate::frame::SensorFrame;
use crate::gate::{CaptureScheduler, FrameGate};
use crate::geometry::ViewGeometry;
use crate::stability::{StabilityConfig, StabilityTracker};
use crate::{convert, LivescanConfig, PipelineError, Point};

/// Preview overlay consumer. Fire-and-forget: no return values, no ordering
/// guarantee relative to rendering.
pub trait OverlaySink: Send + Sync {
    fn set_corners(&self, points: &[Point]);
    fn clear(&self);
}

/// Still-capture trigger. The hardware capture itself happens outside this
/// crate; failures here are user-visible [`PipelineError::Capture`] values
/// and are never retried automatically.
pub trait CaptureSink: Send + Sync {
    fn capture(&self) -> Result<std::path::PathBuf, PipelineError>;
}

/// View-side mapping target, set from the UI thread once layout is known.
#[derive(Clone, Copy, Debug, Default)]
struct ViewTarget {
    width: u32,
    height: u32,
    rotation_degrees: u32,
}

/// Counters over the pipeline's lifetime.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineStats {
    pub frames_seen: u64,
    pub frames_analyzed: u64,
    pub frames_gated: u64,
    pub conversion_failures: u64,
    pub detector_failures: u64,
    pub captures_triggered: u64,
}

/// The per-frame orchestrator.
///
/// Frames are processed one at a time on a single analysis worker
/// (`process_frame` takes `&mut self`); only the capture cooldown is shared
/// with other threads, through [`ManualCaptureHandle`].
///
/// The detector call is synchronous and unbounded: a stalled detector stalls
/// the analysis worker. Upstream keep-only-latest delivery
/// ([`crate::LatestFrameSlot`]) keeps that from growing a backlog.
pub struct Pipeline {
    gate: FrameGate,
    detector: DetectorBackend,
    stability: StabilityTracker,
    scheduler: Arc<CaptureScheduler>,
    overlay: Arc<dyn OverlaySink>,
    sink: Arc<dyn CaptureSink>,
    analysis_max_dim: u32,
    view: Arc<Mutex<ViewTarget>>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(
        config: &LivescanConfig,
        detector: DetectorBackend,
        overlay: Arc<dyn OverlaySink>,
        sink: Arc<dyn CaptureSink>,
    ) -> Self {
        Self {
            gate: FrameGate::new(config.target_fps),
            detector,
            stability: StabilityTracker::new(StabilityConfig {
                required_stable_frames: config.required_stable_frames,
                max_corner_movement_px: config.max_corner_movement_px,
            }),
            scheduler: Arc::new(CaptureScheduler::new(config.capture_cooldown_ms)),
            overlay,
            sink,
            analysis_max_dim: config.analysis_max_dim,
            view: Arc::new(Mutex::new(ViewTarget::default())),
            stats: PipelineStats::default(),
        }
    }

    /// Record the preview view's layout. Until this is called, mapped
    /// overlay points pass through unscaled (see [`ViewGeometry`]).
    ///
    /// Mid-stream updates from another thread go through
    /// [`Pipeline::view_target_handle`], since the analysis worker holds the
    /// pipeline exclusively while frames flow.
    pub fn set_view_target(&self, width: u32, height: u32, rotation_degrees: u32) {
        let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
        *view = ViewTarget {
            width,
            height,
            rotation_degrees,
        };
    }

    /// Handle for the UI thread's layout callbacks. Shares this pipeline's
    /// view target; an update applies from the next analyzed frame.
    pub fn view_target_handle(&self) -> ViewTargetHandle {
        ViewTargetHandle {
            view: self.view.clone(),
        }
    }

    /// Handle for the UI thread's manual capture action. Shares this
    /// pipeline's cooldown state, so a manual tap during an active cooldown
    /// is denied just like an auto-trigger.
    pub fn manual_capture_handle(&self) -> ManualCaptureHandle {
        ManualCaptureHandle {
            scheduler: self.scheduler.clone(),
            sink: self.sink.clone(),
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Run one analysis pass. Consumes the frame; its release hook fires at
    /// return on every path.
    pub fn process_frame(&mut self, frame: SensorFrame) {
        self.stats.frames_seen += 1;
        let now_ms = frame.timestamp_ms;

        if !self.gate.should_analyze(now_ms) {
            self.stats.frames_gated += 1;
            return;
        }

        let nv21 = match convert::interleave_chroma(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.conversion_failures += 1;
                log::warn!("frame at {}ms skipped: {}", now_ms, e);
                return;
            }
        };
        let decoded = match convert::decode_and_rotate(
            &nv21,
            frame.width,
            frame.height,
            frame.rotation_degrees,
        ) {
            Ok(image) => image,
            Err(e) => {
                self.stats.conversion_failures += 1;
                log::warn!("frame at {}ms skipped: {}", now_ms, e);
                return;
            }
        };

        // When downscaling allocates, the full-size decode is dropped inside
        // the move; only one analysis image is ever alive past this point.
        let analysis = downscale(decoded, self.analysis_max_dim).into_image();
        self.stats.frames_analyzed += 1;

        // The backend is third-party code; a panic in it must not take the
        // analysis worker down, so it reads the same as a failed call.
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.detector.detect(&analysis, now_ms)
        }));
        let detection = match outcome {
            Ok(Ok(detection)) => detection,
            Ok(Err(e)) => {
                self.stats.detector_failures += 1;
                let e = PipelineError::Detection(e);
                log::debug!("detector '{}' failed, treating as no corners: {}", self.detector.name(), e);
                None
            }
            Err(payload) => {
                self.stats.detector_failures += 1;
                log::error!(
                    "detector '{}' panicked, treating as no corners: {}",
                    self.detector.name(),
                    panic_message(payload.as_ref())
                );
                None
            }
        };

        let Some(corners) = detection else {
            self.stability.reset();
            self.overlay.clear();
            return;
        };

        let view = *self.view.lock().unwrap_or_else(|e| e.into_inner());
        let geometry = ViewGeometry {
            analysis_width: analysis.width(),
            analysis_height: analysis.height(),
            view_width: view.width,
            view_height: view.height,
            rotation_degrees: view.rotation_degrees,
        };
        let mapped = geometry.map_points(&corners.points);
        self.overlay.set_corners(&mapped);

        let stable = self.stability.push(corners);
        if stable && self.scheduler.try_capture(now_ms) {
            self.stats.captures_triggered += 1;
            match self.sink.capture() {
                Ok(path) => log::info!("auto capture at {}ms -> {}", now_ms, path.display()),
                Err(e) => log::error!("auto capture at {}ms failed: {}", now_ms, e),
            }
            // Reset so the same still-stable pose cannot re-trigger the
            // moment the cooldown lapses.
            self.stability.reset();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Layout updates from the UI thread.
///
/// Holds the same view target as the pipeline, so layout changes land while
/// the analysis worker owns the pipeline for `process_frame`.
#[derive(Clone)]
pub struct ViewTargetHandle {
    view: Arc<Mutex<ViewTarget>>,
}

impl ViewTargetHandle {
    pub fn set(&self, width: u32, height: u32, rotation_degrees: u32) {
        let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
        *view = ViewTarget {
            width,
            height,
            rotation_degrees,
        };
    }
}

/// Manual capture entry point for the UI thread.
///
/// Holds the same [`CaptureScheduler`] instance as the pipeline, so both
/// trigger sources contend on one cooldown.
#[derive(Clone)]
pub struct ManualCaptureHandle {
    scheduler: Arc<CaptureScheduler>,
    sink: Arc<dyn CaptureSink>,
}

impl ManualCaptureHandle {
    /// Request a capture at `now_ms`. `Ok(None)` means the cooldown denied
    /// the request; `Err` is a user-visible capture failure (not retried).
    pub fn request_capture(
        &self,
        now_ms: i64,
    ) -> Result<Option<std::path::PathBuf>, PipelineError> {
        if !self.scheduler.try_capture(now_ms) {
            log::debug!("manual capture at {}ms denied by cooldown", now_ms);
            return Ok(None);
        }
        let path = self.sink.capture()?;
        log::info!("manual capture at {}ms -> {}", now_ms, path.display());
        Ok(Some(path))
    }
}
