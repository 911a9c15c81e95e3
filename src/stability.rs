//! Consecutive-detection streak tracking.
//!
//! The tracker answers one question per detection: has the document outline
//! held still long enough to auto-capture? It is unlocked until a detection
//! arrives, then accumulates a streak of "similar enough" frames and resets
//! whenever the outline jumps or vanishes.

use crate::CornerSet;

/// Streak configuration.
#[derive(Clone, Copy, Debug)]
pub struct StabilityConfig {
    /// Consecutive similar detections required before the pose counts as
    /// stable.
    pub required_stable_frames: u32,
    /// Largest per-corner movement (px, index-paired) still considered the
    /// same pose.
    pub max_corner_movement_px: f32,
}

/// State machine accumulating consecutive similar detections.
///
/// Mutated only through [`push`](Self::push) and [`reset`](Self::reset).
pub struct StabilityTracker {
    config: StabilityConfig,
    last_corners: Option<CornerSet>,
    consecutive_count: u32,
}

impl StabilityTracker {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            last_corners: None,
            consecutive_count: 0,
        }
    }

    /// Feed one detection. Returns whether the streak has reached the
    /// required length.
    ///
    /// Movement is the maximum index-paired Euclidean distance to the
    /// previous corners; anything above the threshold restarts the streak at
    /// 1 (the new pose itself counts as its first frame).
    pub fn push(&mut self, corners: CornerSet) -> bool {
        self.consecutive_count = match self.last_corners {
            None => 1,
            Some(prev) => {
                if corners.max_movement(&prev) <= self.config.max_corner_movement_px {
                    self.consecutive_count + 1
                } else {
                    1
                }
            }
        };
        self.last_corners = Some(corners);
        self.consecutive_count >= self.config.required_stable_frames
    }

    /// Clear all history. Called when detection finds nothing, and right
    /// after a capture fires so the same still-stable pose cannot re-trigger
    /// immediately.
    pub fn reset(&mut self) {
        self.last_corners = None;
        self.consecutive_count = 0;
    }

    /// Current streak length.
    pub fn consecutive_count(&self) -> u32 {
        self.consecutive_count
    }
}
