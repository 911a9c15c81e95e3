//! Boundary detector contract and backends.
//!
//! The contour/corner-finding algorithm itself lives outside this crate. The
//! pipeline talks to it through [`BoundaryDetector`] and selects one of a
//! closed set of backends at construction time: the real detector supplied
//! by the application, or the scriptable mock used by tests and demos.

mod backend;
mod backends;

pub use backend::BoundaryDetector;
pub use backends::{MockDetector, MockOutcome};

use anyhow::Result;
use image::DynamicImage;

use crate::CornerSet;

/// Detector selected once at pipeline construction. No per-call dispatch
/// beyond this enum.
pub enum DetectorBackend {
    Mock(MockDetector),
    Real(Box<dyn BoundaryDetector>),
}

impl DetectorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorBackend::Mock(d) => d.name(),
            DetectorBackend::Real(d) => d.name(),
        }
    }

    /// Run detection. Errors are the caller's to swallow: the pipeline
    /// treats them identically to "no corners found".
    pub fn detect(
        &mut self,
        image: &DynamicImage,
        timestamp_ms: i64,
    ) -> Result<Option<CornerSet>> {
        match self {
            DetectorBackend::Mock(d) => d.detect(image, timestamp_ms),
            DetectorBackend::Real(d) => d.detect(image, timestamp_ms),
        }
    }
}
