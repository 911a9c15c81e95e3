use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use image::DynamicImage;

use crate::detect::backend::BoundaryDetector;
use crate::{CornerSet, Point};

/// One scripted detector response.
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Four corners in analysis-image space (TL, TR, BR, BL).
    Corners([Point; 4]),
    /// No document outline found.
    NoCorners,
    /// Detector failure; the pipeline must read this as "no corners".
    Fails(&'static str),
}

/// Scriptable detector for tests and demos.
///
/// Outcomes are consumed front-to-back; an exhausted script keeps returning
/// the last outcome (or "no corners" when never scripted), so a fixed pose
/// can be held for as many frames as a scenario needs.
pub struct MockDetector {
    script: VecDeque<MockOutcome>,
    last: Option<MockOutcome>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            last: None,
        }
    }

    /// Append one outcome to the script.
    pub fn push_outcome(&mut self, outcome: MockOutcome) {
        self.script.push_back(outcome);
    }

    /// Convenience: hold a fixed pose for `frames` frames.
    pub fn hold_pose(&mut self, corners: [Point; 4], frames: usize) {
        for _ in 0..frames {
            self.push_outcome(MockOutcome::Corners(corners));
        }
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryDetector for MockDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(&mut self, _image: &DynamicImage, timestamp_ms: i64) -> Result<Option<CornerSet>> {
        let outcome = match self.script.pop_front() {
            Some(outcome) => {
                self.last = Some(outcome.clone());
                outcome
            }
            None => self.last.clone().unwrap_or(MockOutcome::NoCorners),
        };

        match outcome {
            MockOutcome::Corners(points) => Ok(Some(CornerSet::new(points, timestamp_ms))),
            MockOutcome::NoCorners => Ok(None),
            MockOutcome::Fails(reason) => Err(anyhow!("mock detector failure: {}", reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
    }

    #[test]
    fn script_plays_in_order_then_repeats_last() -> Result<()> {
        let mut detector = MockDetector::new();
        detector.push_outcome(MockOutcome::NoCorners);
        detector.push_outcome(MockOutcome::Corners(unit_square()));

        assert!(detector.detect(&blank(), 1)?.is_none());
        let corners = detector.detect(&blank(), 2)?.expect("corners");
        assert_eq!(corners.timestamp_ms, 2);

        // Script exhausted: last outcome repeats.
        assert!(detector.detect(&blank(), 3)?.is_some());
        Ok(())
    }

    #[test]
    fn unscripted_detector_finds_nothing() -> Result<()> {
        let mut detector = MockDetector::new();
        assert!(detector.detect(&blank(), 0)?.is_none());
        Ok(())
    }

    #[test]
    fn scripted_failure_is_an_error() {
        let mut detector = MockDetector::new();
        detector.push_outcome(MockOutcome::Fails("induced"));
        assert!(detector.detect(&blank(), 0).is_err());
    }
}
