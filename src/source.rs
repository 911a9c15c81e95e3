//! Synthetic frame source for demos and end-to-end tests.
//!
//! Produces planar YUV 4:2:0 frames showing a bright "page" rectangle on a
//! dark background, with optional row padding so the stride-handling paths
//! get exercised, and a monotonic millisecond clock derived from the frame
//! rate.

use rand::Rng;

use crate::frame::{FramePlane, SensorFrame};

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Rotation metadata stamped on emitted frames.
    pub rotation_degrees: u32,
    /// Extra bytes appended to each luma row, to simulate padded sensor
    /// buffers.
    pub row_padding: usize,
    /// Emitted frame rate; drives the synthetic timestamp clock.
    pub fps: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            rotation_degrees: 0,
            row_padding: 0,
            fps: 30,
        }
    }
}

/// Statistics for a synthetic source.
#[derive(Clone, Copy, Debug)]
pub struct SourceStats {
    pub frames_emitted: u64,
}

/// Synthetic sensor. Emits a slowly drifting page rectangle so a downstream
/// detector (or a scripted mock) has something plausible to look at.
pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    clock_ms: i64,
    frame_interval_ms: i64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let frame_interval_ms = if config.fps == 0 {
            33
        } else {
            (1000 / config.fps).max(1) as i64
        };
        Self {
            config,
            frame_count: 0,
            clock_ms: 0,
            frame_interval_ms,
        }
    }

    /// Emit the next frame. The caller owns it; no release hook is attached
    /// (synthetic buffers have nothing to give back to hardware).
    pub fn next_frame(&mut self) -> SensorFrame {
        self.frame_count += 1;
        self.clock_ms += self.frame_interval_ms;

        let (y, u, v) = self.generate_planes();
        let luma_stride = self.config.width as usize + self.config.row_padding;

        SensorFrame::new(
            [
                FramePlane {
                    data: y,
                    row_stride: luma_stride,
                    pixel_stride: 1,
                },
                FramePlane::packed(u, (self.config.width / 2) as usize),
                FramePlane::packed(v, (self.config.width / 2) as usize),
            ],
            self.config.width,
            self.config.height,
            self.config.rotation_degrees,
            self.clock_ms,
        )
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_emitted: self.frame_count,
        }
    }

    /// Bright page rectangle over a dark background, drifting one pixel
    /// every 50 frames, plus sensor noise.
    fn generate_planes(&mut self) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let stride = w + self.config.row_padding;
        let drift = (self.frame_count / 50) as usize;

        let page_left = w / 4 + drift % (w / 8).max(1);
        let page_right = w * 3 / 4 + drift % (w / 8).max(1);
        let page_top = h / 4;
        let page_bottom = h * 3 / 4;

        let mut rng = rand::thread_rng();
        let mut y = vec![0u8; stride * h];
        for row in 0..h {
            for col in 0..w {
                let on_page = row >= page_top && row < page_bottom && col >= page_left && col < page_right;
                let base: u8 = if on_page { 220 } else { 40 };
                let noise: i16 = rng.gen_range(-4..=4);
                y[row * stride + col] = (base as i16 + noise).clamp(0, 255) as u8;
            }
        }

        // Neutral chroma: the synthetic scene is grayscale.
        let chroma_len = (w / 2) * (h / 2);
        (y, vec![128u8; chroma_len], vec![128u8; chroma_len])
    }
}
