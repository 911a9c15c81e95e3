//! Pixel buffer reformatting.
//!
//! Camera sensors deliver planar YUV 4:2:0 with arbitrary row and pixel
//! strides. [`interleave_chroma`] reformats such a buffer into a packed NV21
//! layout (full Y plane followed by VU-interleaved chroma), which
//! [`decode_and_rotate`] then turns into an upright RGB image by way of a
//! lossy JPEG round-trip. The codec round-trip is deliberate: it is portable
//! across sensor chroma layouts where a direct colorspace conversion would
//! need per-device cases.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

use crate::frame::SensorFrame;
use crate::PipelineError;

/// JPEG quality for the decode round-trip. High enough that boundary
/// detection is unaffected.
const ROUND_TRIP_JPEG_QUALITY: u8 = 90;

/// Reformat a planar YUV 4:2:0 frame into packed NV21 bytes: the full luma
/// plane, then one V and one U sample per 2x2 pixel block, strictly
/// VU-interleaved regardless of the source layout.
///
/// The output length is always `width * height * 3 / 2`. Short or malformed
/// plane data fails with [`PipelineError::Conversion`]; the caller skips the
/// frame and the pipeline continues.
pub fn interleave_chroma(frame: &SensorFrame) -> Result<Vec<u8>, PipelineError> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let luma_len = width
        .checked_mul(height)
        .ok_or_else(|| PipelineError::Conversion("frame dimensions overflow".into()))?;
    let out_len = luma_len + luma_len / 2;

    let [y_plane, u_plane, v_plane] = frame.planes();
    let mut out = Vec::with_capacity(out_len);

    // Luma: one bulk copy when the plane is tightly packed, otherwise copy
    // row-by-row honoring the stride and truncating each row to `width`.
    if y_plane.row_stride == width && y_plane.pixel_stride == 1 {
        let data = y_plane.data.get(..luma_len).ok_or_else(|| {
            PipelineError::Conversion(format!(
                "luma plane too short: expected {}, got {}",
                luma_len,
                y_plane.data.len()
            ))
        })?;
        out.extend_from_slice(data);
    } else {
        for row in 0..height {
            let row_start = row * y_plane.row_stride;
            if y_plane.pixel_stride == 1 {
                let row_bytes = y_plane.data.get(row_start..row_start + width).ok_or_else(
                    || PipelineError::Conversion(format!("luma row {} out of bounds", row)),
                )?;
                out.extend_from_slice(row_bytes);
            } else {
                for col in 0..width {
                    let idx = row_start + col * y_plane.pixel_stride;
                    let sample = y_plane.data.get(idx).ok_or_else(|| {
                        PipelineError::Conversion(format!("luma sample ({}, {}) out of bounds", row, col))
                    })?;
                    out.push(*sample);
                }
            }
        }
    }

    // Chroma: both planes are subsampled 2x2. Write V then U for each logical
    // chroma column, advancing by each plane's own pixel stride.
    for row in 0..height / 2 {
        let v_row = row * v_plane.row_stride;
        let u_row = row * u_plane.row_stride;
        for col in 0..width / 2 {
            let v_idx = v_row + col * v_plane.pixel_stride;
            let u_idx = u_row + col * u_plane.pixel_stride;
            let v = v_plane.data.get(v_idx).ok_or_else(|| {
                PipelineError::Conversion(format!("chroma V sample ({}, {}) out of bounds", row, col))
            })?;
            let u = u_plane.data.get(u_idx).ok_or_else(|| {
                PipelineError::Conversion(format!("chroma U sample ({}, {}) out of bounds", row, col))
            })?;
            out.push(*v);
            out.push(*u);
        }
    }

    // Hard postcondition on the packed layout.
    if out.len() != out_len {
        return Err(PipelineError::Conversion(format!(
            "packed NV21 length mismatch: expected {}, got {}",
            out_len,
            out.len()
        )));
    }

    Ok(out)
}

/// Decode packed NV21 bytes into an upright RGB image.
///
/// The buffer is expanded to RGB, compressed through JPEG at quality
/// [`ROUND_TRIP_JPEG_QUALITY`], decoded back, and rotated by
/// `rotation_degrees` (0/90/180/270). Rotation consumes the pre-rotation
/// image; callers only ever own the final allocation.
pub fn decode_and_rotate(
    nv21: &[u8],
    width: u32,
    height: u32,
    rotation_degrees: u32,
) -> Result<DynamicImage, PipelineError> {
    let rgb = nv21_to_rgb(nv21, width, height)?;
    let rgb_image = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PipelineError::Conversion("RGB buffer does not match dimensions".into()))?;

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, ROUND_TRIP_JPEG_QUALITY)
        .encode_image(&rgb_image)
        .map_err(|e| PipelineError::Conversion(format!("JPEG encode failed: {}", e)))?;
    let decoded = image::load_from_memory(&jpeg)
        .map_err(|e| PipelineError::Conversion(format!("JPEG decode failed: {}", e)))?;

    let upright = match rotation_degrees % 360 {
        0 => decoded,
        90 => decoded.rotate90(),
        180 => decoded.rotate180(),
        270 => decoded.rotate270(),
        other => {
            return Err(PipelineError::Conversion(format!(
                "unsupported rotation: {} degrees",
                other
            )))
        }
    };

    Ok(upright)
}

/// Expand packed NV21 (Y plane + VU-interleaved chroma) to RGB24.
fn nv21_to_rgb(nv21: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PipelineError> {
    let w = width as usize;
    let h = height as usize;
    // NV21 subsamples chroma 2x2; odd dimensions have no valid layout and
    // would index past the chroma plane below.
    if w % 2 != 0 || h % 2 != 0 {
        return Err(PipelineError::Conversion(format!(
            "NV21 requires even dimensions, got {}x{}",
            width, height
        )));
    }
    let y_plane = w
        .checked_mul(h)
        .ok_or_else(|| PipelineError::Conversion("NV21 frame dimensions overflow".into()))?;
    let expected = y_plane + y_plane / 2;
    if nv21.len() != expected {
        return Err(PipelineError::Conversion(format!(
            "NV21 frame length mismatch: expected {}, got {}",
            expected,
            nv21.len()
        )));
    }

    let mut rgb = vec![0u8; y_plane * 3];
    for j in 0..h {
        for i in 0..w {
            let y = nv21[j * w + i] as f32;
            let vu_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let v = nv21[vu_index] as f32 - 128.0;
            let u = nv21[vu_index + 1] as f32 - 128.0;

            let r = y + 1.402_f32 * v;
            let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
            let b = y + 1.772_f32 * u;

            let offset = (j * w + i) * 3;
            rgb[offset] = clamp_to_u8(r);
            rgb[offset + 1] = clamp_to_u8(g);
            rgb[offset + 2] = clamp_to_u8(b);
        }
    }

    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
