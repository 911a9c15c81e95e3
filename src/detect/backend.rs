use anyhow::Result;
use image::DynamicImage;

use crate::CornerSet;

/// Document boundary detector.
///
/// # Contract
///
/// - Input is a downscaled analysis image; returned corner coordinates are
///   in that image's pixel space.
/// - A successful call returns either exactly four ordered corners (TL, TR,
///   BR, BL, see [`CornerSet`]) or `None`. There is no partial result.
/// - The call is synchronous and runs on the analysis worker; a stalled
///   implementation stalls the worker.
/// - Implementations may fail. Callers must treat any error identically to
///   "no corners found"; errors never propagate out of a frame pass. The
///   pipeline also contains panics from `detect` and reads them the same
///   way, though the backend's internal state after a panic is its own
///   problem.
pub trait BoundaryDetector: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Detect a document outline in `image`. `timestamp_ms` stamps the
    /// returned corner set.
    fn detect(&mut self, image: &DynamicImage, timestamp_ms: i64) -> Result<Option<CornerSet>>;
}
