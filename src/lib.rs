//! livescan - live document-capture analysis pipeline
//!
//! This crate implements the analysis core of a document scanner's live
//! preview: it consumes a stream of camera frames, throttles analysis,
//! converts planar YUV sensor buffers into decodable images, tracks whether
//! a detected document outline holds still across frames, maps detected
//! corners into the preview overlay's coordinate space, and decides under a
//! cooldown when to auto-trigger a capture.
//!
//! # Architecture
//!
//! Per-frame control flow:
//!
//! `FrameGate` -> `convert` -> `downscale` -> `DetectorBackend` ->
//! {`StabilityTracker`, `ViewGeometry::map_points`} -> `CaptureScheduler` ->
//! `CaptureSink`
//!
//! Invariants enforced by construction:
//!
//! 1. **Release exactly once**: a [`SensorFrame`]'s buffer release hook fires
//!    exactly once, on every exit path, via `Drop`.
//! 2. **Atomic gating**: the analysis throttle and the capture cooldown use
//!    atomic read-modify-write updates, never plain read-then-write, so
//!    concurrent callers can never both observe "permitted".
//! 3. **No failure escapes the frame pass**: conversion failures skip the
//!    frame, detector errors and panics read as "no corners", and the
//!    camera stream is never torn down by a transient error.
//!
//! # Module Structure
//!
//! - `frame`: sensor frame ownership ([`SensorFrame`], [`LatestFrameSlot`])
//! - `convert`: pixel buffer reformatting and decode/rotate
//! - `downscale`: bounded-size analysis copies
//! - `detect`: boundary detector contract and backends
//! - `stability`: consecutive-detection streak tracking
//! - `geometry`: analysis-space to view-space point mapping
//! - `gate`: analysis throttle and capture cooldown
//! - `pipeline`: the per-frame orchestrator
//! - `config`: runtime configuration
//! - `source`: synthetic frame source for demos and tests

use thiserror::Error;

pub mod config;
pub mod convert;
pub mod detect;
pub mod downscale;
pub mod frame;
pub mod gate;
pub mod geometry;
pub mod pipeline;
pub mod source;
pub mod stability;

pub use config::LivescanConfig;
pub use convert::{decode_and_rotate, interleave_chroma};
pub use detect::{BoundaryDetector, DetectorBackend, MockDetector};
pub use downscale::{downscale, Downscaled};
pub use frame::{FramePlane, LatestFrameSlot, SensorFrame};
pub use gate::{CaptureScheduler, FrameGate};
pub use geometry::ViewGeometry;
pub use pipeline::{
    CaptureSink, ManualCaptureHandle, OverlaySink, Pipeline, PipelineStats, ViewTargetHandle,
};
pub use source::SyntheticSource;
pub use stability::StabilityTracker;

// -------------------- Error taxonomy --------------------

/// Failures that can occur inside or at the boundary of the frame pipeline.
///
/// `Conversion` and `Detection` are non-fatal to the pipeline: the frame is
/// skipped or the detection is treated as "no corners". `Capture` is surfaced
/// to the caller as a user-visible failure and never retried automatically.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pixel buffer conversion failed: {0}")]
    Conversion(String),

    #[error("boundary detection failed: {0}")]
    Detection(anyhow::Error),

    #[error("capture failed: {0}")]
    Capture(String),
}

// -------------------- Core geometry types --------------------

/// A point in pixel coordinates. Analysis space or view space depending on
/// context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Four ordered corner points of a detected document boundary, in
/// analysis-image pixel space.
///
/// # Ordering contract
///
/// Detectors must emit corners in top-left, top-right, bottom-right,
/// bottom-left order, and index `i` in one frame must correspond to the same
/// physical corner as index `i` in the next. The stability tracker compares
/// corners index-pairwise; a detector that flips orientation between frames
/// will (correctly) read as unstable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerSet {
    pub points: [Point; 4],
    /// When the detection was made, in the pipeline's millisecond clock.
    pub timestamp_ms: i64,
}

impl CornerSet {
    pub fn new(points: [Point; 4], timestamp_ms: i64) -> Self {
        Self {
            points,
            timestamp_ms,
        }
    }

    /// Maximum index-paired distance to another corner set.
    pub fn max_movement(&self, other: &CornerSet) -> f32 {
        self.points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| a.distance_to(b))
            .fold(0.0f32, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_error_carries_the_backend_message() {
        let err = PipelineError::Detection(anyhow::anyhow!("model not loaded"));
        assert_eq!(err.to_string(), "boundary detection failed: model not loaded");
    }

    #[test]
    fn point_distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn max_movement_takes_the_largest_pair() {
        let a = CornerSet::new(
            [
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            0,
        );
        let mut shifted = a;
        shifted.points[2] = Point::new(16.0, 18.0); // moved by 10
        shifted.points[0] = Point::new(1.0, 0.0); // moved by 1
        assert_eq!(a.max_movement(&shifted), 10.0);
    }
}
