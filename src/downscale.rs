//! Bounded-size analysis copies.
//!
//! Boundary detection runs on a downscaled copy so per-frame cost stays
//! bounded regardless of sensor resolution. When the decoded image already
//! fits the bound, no copy is made; the result records whether an allocation
//! happened so the orchestrator knows which image to drop when.

use image::imageops::FilterType;
use image::DynamicImage;

/// Result of [`downscale`]: either the original image passed through, or a
/// freshly allocated scaled copy.
pub enum Downscaled {
    Unchanged(DynamicImage),
    Scaled(DynamicImage),
}

impl Downscaled {
    pub fn image(&self) -> &DynamicImage {
        match self {
            Downscaled::Unchanged(img) | Downscaled::Scaled(img) => img,
        }
    }

    /// True when downscaling allocated a new image distinct from the input.
    pub fn did_allocate(&self) -> bool {
        matches!(self, Downscaled::Scaled(_))
    }

    pub fn into_image(self) -> DynamicImage {
        match self {
            Downscaled::Unchanged(img) | Downscaled::Scaled(img) => img,
        }
    }
}

/// Scale `image` so its larger dimension equals `max_dim`, preserving aspect
/// ratio, using smooth (triangle) interpolation. Returns the input untouched
/// when it already fits.
pub fn downscale(image: DynamicImage, max_dim: u32) -> Downscaled {
    if image.width().max(image.height()) <= max_dim {
        return Downscaled::Unchanged(image);
    }
    Downscaled::Scaled(image.resize(max_dim, max_dim, FilterType::Triangle))
}
