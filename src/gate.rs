//! Analysis throttle and capture cooldown.
//!
//! Both gates guard a single shared timestamp that more than one thread may
//! race on (the analysis worker and the UI's manual-capture path). Each
//! decision is one atomic read-modify-write via `fetch_update`; two callers
//! can never both observe "permitted" for the same window.
//!
//! A negative stored timestamp means "never", so the first request always
//! passes and the `now - last` arithmetic stays well away from overflow.

use std::sync::atomic::{AtomicI64, Ordering};

const NEVER: i64 = -1;

/// Rate limit on how often the analysis chain runs.
pub struct FrameGate {
    min_interval_ms: i64,
    last_analyzed_ms: AtomicI64,
}

impl FrameGate {
    pub fn new(target_fps: u32) -> Self {
        let min_interval_ms = if target_fps == 0 {
            0
        } else {
            (1000 / target_fps) as i64
        };
        Self {
            min_interval_ms,
            last_analyzed_ms: AtomicI64::new(NEVER),
        }
    }

    /// Atomically decide whether a frame delivered at `now_ms` should be
    /// analyzed. On `true` the gate timestamp advances to `now_ms`; on
    /// `false` there is no side effect.
    pub fn should_analyze(&self, now_ms: i64) -> bool {
        self.last_analyzed_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last < 0 || now_ms - last >= self.min_interval_ms {
                    Some(now_ms)
                } else {
                    None
                }
            })
            .is_ok()
    }

    pub fn min_interval_ms(&self) -> i64 {
        self.min_interval_ms
    }
}

/// Cooldown gate shared by the auto-capture and manual-capture paths.
///
/// Both trigger sources consult the same instance, so a manual tap during an
/// active cooldown is denied exactly like an auto-trigger would be.
pub struct CaptureScheduler {
    cooldown_ms: i64,
    last_capture_ms: AtomicI64,
}

impl CaptureScheduler {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms: cooldown_ms as i64,
            last_capture_ms: AtomicI64::new(NEVER),
        }
    }

    /// Atomic test-and-set: permit a capture at `now_ms` only when the
    /// cooldown since the last accepted capture has fully elapsed. Denied
    /// requests leave the state untouched.
    pub fn try_capture(&self, now_ms: i64) -> bool {
        self.last_capture_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last < 0 || now_ms - last > self.cooldown_ms {
                    Some(now_ms)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn frame_gate_enforces_minimum_interval() {
        let gate = FrameGate::new(8); // 125ms
        assert!(gate.should_analyze(1_000));
        assert!(!gate.should_analyze(1_100));
        assert!(!gate.should_analyze(1_124));
        assert!(gate.should_analyze(1_125));
    }

    #[test]
    fn frame_gate_denial_has_no_side_effect() {
        let gate = FrameGate::new(8);
        assert!(gate.should_analyze(1_000));
        assert!(!gate.should_analyze(1_060));
        // Interval still measured from 1000, not 1060.
        assert!(gate.should_analyze(1_125));
    }

    #[test]
    fn first_frame_always_passes() {
        let gate = FrameGate::new(8);
        assert!(gate.should_analyze(0));
    }

    #[test]
    fn scheduler_enforces_cooldown() {
        let scheduler = CaptureScheduler::new(1_500);
        assert!(scheduler.try_capture(0));
        assert!(!scheduler.try_capture(1_000));
        assert!(scheduler.try_capture(1_600));
    }

    #[test]
    fn cooldown_boundary_is_exclusive() {
        let scheduler = CaptureScheduler::new(1_500);
        assert!(scheduler.try_capture(0));
        assert!(!scheduler.try_capture(1_500));
        assert!(scheduler.try_capture(1_501));
    }

    #[test]
    fn concurrent_requests_admit_exactly_one() {
        let scheduler = Arc::new(CaptureScheduler::new(1_500));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let scheduler = scheduler.clone();
            handles.push(std::thread::spawn(move || scheduler.try_capture(5_000)));
        }
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
