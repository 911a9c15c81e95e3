//! Sensor frame ownership.
//!
//! A [`SensorFrame`] wraps one raw camera buffer delivery. The hardware layer
//! that hands frames to the pipeline attaches a release hook; the hook fires
//! exactly once, when the frame is dropped, on every exit path including
//! early returns and panics unwinding through the pipeline. Call sites never
//! release manually.
//!
//! [`LatestFrameSlot`] implements the upstream backpressure policy: when the
//! analysis worker cannot keep pace with the sensor, delivering a new frame
//! replaces (and thereby releases) the undelivered one, so the pipeline never
//! accumulates backlog.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One plane of a planar pixel buffer.
///
/// `row_stride` is the byte distance between the starts of two consecutive
/// rows and may exceed the row's logical width. `pixel_stride` is the byte
/// distance between two consecutive samples within a row and may exceed 1
/// (e.g. semi-planar chroma delivered as interleaved pairs).
#[derive(Clone, Debug)]
pub struct FramePlane {
    pub data: Vec<u8>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl FramePlane {
    /// A tightly packed plane (`row_stride == width`, `pixel_stride == 1`).
    pub fn packed(data: Vec<u8>, width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pixel_stride: 1,
        }
    }
}

/// One raw sensor image delivery: a planar YUV 4:2:0 buffer (Y, U, V planes)
/// plus metadata, exclusively owned by the pipeline for the duration of one
/// analysis pass.
pub struct SensorFrame {
    /// Y, U, V planes. Private: consumers go through [`Self::planes`].
    planes: [FramePlane; 3],

    pub width: u32,
    pub height: u32,

    /// Rotation needed to bring the sensor image upright: 0, 90, 180 or 270.
    pub rotation_degrees: u32,

    /// Delivery timestamp in the pipeline's millisecond clock.
    pub timestamp_ms: i64,

    /// Fired exactly once, from `Drop`.
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SensorFrame {
    pub fn new(
        planes: [FramePlane; 3],
        width: u32,
        height: u32,
        rotation_degrees: u32,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            planes,
            width,
            height,
            rotation_degrees,
            timestamp_ms,
            release: None,
        }
    }

    /// Attach the buffer release hook. The hook runs when the frame drops,
    /// regardless of which pipeline branch executed.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Y, U, V planes in that order.
    pub fn planes(&self) -> &[FramePlane; 3] {
        &self.planes
    }
}

impl Drop for SensorFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for SensorFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("timestamp_ms", &self.timestamp_ms)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// LatestFrameSlot: keep-only-latest backpressure
// ----------------------------------------------------------------------------

/// Single-slot frame mailbox between the sensor callback and the analysis
/// worker.
///
/// `offer` replaces any frame still waiting in the slot; the replaced frame
/// drops, which fires its release hook. `take` hands the waiting frame to
/// the worker. No queue ever forms.
pub struct LatestFrameSlot {
    slot: Mutex<Option<SensorFrame>>,
    dropped: AtomicU64,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            dropped: AtomicU64::new(0),
        }
    }

    /// Deliver a frame. If a frame is already waiting it is replaced and
    /// released.
    pub fn offer(&self, frame: SensorFrame) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.replace(frame).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the waiting frame, if any.
    pub fn take(&self) -> Option<SensorFrame> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Frames replaced before the worker took them.
    pub fn frames_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for LatestFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
