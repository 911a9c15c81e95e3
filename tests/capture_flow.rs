//! End-to-end capture flow: stable streaks, cooldown windows, and the
//! release-exactly-once guarantee across a whole run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use livescan::detect::MockOutcome;
use livescan::{
    CaptureSink, DetectorBackend, FramePlane, LivescanConfig, MockDetector, OverlaySink,
    Pipeline, PipelineError, Point, SensorFrame,
};

struct NullOverlay;

impl OverlaySink for NullOverlay {
    fn set_corners(&self, _points: &[Point]) {}
    fn clear(&self) {}
}

struct CountingSink {
    capture_times: Mutex<Vec<i64>>,
    clock: Arc<Mutex<i64>>,
}

impl CaptureSink for CountingSink {
    fn capture(&self) -> Result<PathBuf, PipelineError> {
        let now = *self.clock.lock().unwrap();
        self.capture_times.lock().unwrap().push(now);
        Ok(PathBuf::from("/tmp/capture.jpg"))
    }
}

fn page_pose() -> [Point; 4] {
    [
        Point::new(8.0, 4.0),
        Point::new(24.0, 4.0),
        Point::new(24.0, 12.0),
        Point::new(8.0, 12.0),
    ]
}

fn frame_at(timestamp_ms: i64, releases: Arc<AtomicUsize>) -> SensorFrame {
    SensorFrame::new(
        [
            FramePlane::packed(vec![120u8; 32 * 16], 32),
            FramePlane::packed(vec![128u8; 16 * 8], 16),
            FramePlane::packed(vec![128u8; 16 * 8], 16),
        ],
        32,
        16,
        0,
        timestamp_ms,
    )
    .with_release_hook(move || {
        releases.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn two_stable_streaks_across_a_cooldown_capture_exactly_twice() {
    let config = LivescanConfig {
        target_fps: 8,
        analysis_max_dim: 64,
        required_stable_frames: 3,
        max_corner_movement_px: 8.0,
        capture_cooldown_ms: 1_500,
    };

    // First streak of exactly `required_stable_frames` identical poses, a
    // no-document gap longer than the cooldown, then a second streak.
    let mut detector = MockDetector::new();
    detector.hold_pose(page_pose(), 3);
    for _ in 0..12 {
        detector.push_outcome(MockOutcome::NoCorners);
    }
    detector.hold_pose(page_pose(), 3);

    let clock = Arc::new(Mutex::new(0i64));
    let sink = Arc::new(CountingSink {
        capture_times: Mutex::new(Vec::new()),
        clock: clock.clone(),
    });
    let mut pipeline = Pipeline::new(
        &config,
        DetectorBackend::Mock(detector),
        Arc::new(NullOverlay),
        sink.clone(),
    );

    let releases = Arc::new(AtomicUsize::new(0));
    let mut frames_sent = 0usize;
    let mut now = 0i64;
    for _ in 0..18 {
        *clock.lock().unwrap() = now;
        pipeline.process_frame(frame_at(now, releases.clone()));
        frames_sent += 1;
        now += 200; // clears the 125ms analysis gate every time
    }

    let times = sink.capture_times.lock().unwrap().clone();
    assert_eq!(times.len(), 2, "expected exactly two captures, got {:?}", times);
    // First streak completes on the third frame.
    assert_eq!(times[0], 400);
    // Second streak completes three frames into the second pose window, and
    // well past the cooldown.
    assert!(times[1] - times[0] > 1_500);

    // Every frame released exactly once over the whole scenario.
    assert_eq!(releases.load(Ordering::SeqCst), frames_sent);
}

#[test]
fn manual_and_auto_capture_contend_on_one_cooldown() {
    let config = LivescanConfig {
        target_fps: 8,
        analysis_max_dim: 64,
        required_stable_frames: 2,
        max_corner_movement_px: 8.0,
        capture_cooldown_ms: 1_500,
    };

    let mut detector = MockDetector::new();
    detector.hold_pose(page_pose(), 8);

    let clock = Arc::new(Mutex::new(0i64));
    let sink = Arc::new(CountingSink {
        capture_times: Mutex::new(Vec::new()),
        clock: clock.clone(),
    });
    let mut pipeline = Pipeline::new(
        &config,
        DetectorBackend::Mock(detector),
        Arc::new(NullOverlay),
        sink.clone(),
    );
    let handle = pipeline.manual_capture_handle();

    let releases = Arc::new(AtomicUsize::new(0));

    // Manual capture first: wins the cooldown window.
    *clock.lock().unwrap() = 0;
    let granted = handle.request_capture(0).expect("no capture error");
    assert!(granted.is_some());

    // A stable streak inside the cooldown cannot auto-capture.
    for now in [200i64, 400, 600] {
        *clock.lock().unwrap() = now;
        pipeline.process_frame(frame_at(now, releases.clone()));
    }
    assert_eq!(sink.capture_times.lock().unwrap().len(), 1);

    // Once the cooldown lapses the still-stable pose auto-captures.
    *clock.lock().unwrap() = 1_600;
    pipeline.process_frame(frame_at(1_600, releases.clone()));
    assert_eq!(sink.capture_times.lock().unwrap().len(), 2);

    assert_eq!(releases.load(Ordering::SeqCst), 4);
}
