//! Analysis-space to view-space point mapping.
//!
//! The preview surface center-crops the camera image to fill the view, so a
//! detected corner's analysis coordinates must be scaled, offset, and
//! rotated before the overlay can draw them. The model: whichever axis of
//! the analysis image is relatively larger overflows the view and is
//! centered; the other axis determines the scale.

use crate::Point;

/// Inputs to the point mapping for one frame. Not persisted.
#[derive(Clone, Copy, Debug)]
pub struct ViewGeometry {
    pub analysis_width: u32,
    pub analysis_height: u32,
    pub view_width: u32,
    pub view_height: u32,
    /// Display rotation relative to the analysis image: 0, 90, 180 or 270.
    pub rotation_degrees: u32,
}

impl ViewGeometry {
    /// Map analysis-space points into view space under the center-crop
    /// model, then rotate into the display orientation.
    ///
    /// Before the view has been laid out (`view_width` or `view_height` is
    /// zero) the points are returned unchanged; this is a guard, not an
    /// error.
    pub fn map_points(&self, points: &[Point]) -> Vec<Point> {
        if self.view_width == 0 || self.view_height == 0 {
            return points.to_vec();
        }

        let aw = self.analysis_width as f32;
        let ah = self.analysis_height as f32;
        let vw = self.view_width as f32;
        let vh = self.view_height as f32;

        // Relatively wider analysis image: height fills the view, width
        // overflows and is centered. Otherwise the reverse.
        let (scale, offset_x, offset_y) = if aw / ah > vw / vh {
            let scale = vh / ah;
            ((scale), (vw - aw * scale) / 2.0, 0.0)
        } else {
            let scale = vw / aw;
            ((scale), 0.0, (vh - ah * scale) / 2.0)
        };

        points
            .iter()
            .map(|p| {
                let x = p.x * scale + offset_x;
                let y = p.y * scale + offset_y;
                self.rotate_into_view(x, y)
            })
            .collect()
    }

    /// Rotate a scaled point by the display rotation, using the view's
    /// width/height as the rotation's bounding box.
    fn rotate_into_view(&self, x: f32, y: f32) -> Point {
        let vw = self.view_width as f32;
        let vh = self.view_height as f32;
        match self.rotation_degrees % 360 {
            90 => Point::new(y, vw - x),
            180 => Point::new(vw - x, vh - y),
            270 => Point::new(vh - y, x),
            _ => Point::new(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners() -> Vec<Point> {
        vec![
            Point::new(10.0, 20.0),
            Point::new(90.0, 20.0),
            Point::new(90.0, 70.0),
            Point::new(10.0, 70.0),
        ]
    }

    #[test]
    fn matching_dimensions_are_identity() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 80,
            view_width: 100,
            view_height: 80,
            rotation_degrees: 0,
        };
        assert_eq!(geo.map_points(&corners()), corners());
    }

    #[test]
    fn unlaid_out_view_passes_points_through() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 80,
            view_width: 0,
            view_height: 0,
            rotation_degrees: 90,
        };
        assert_eq!(geo.map_points(&corners()), corners());
    }

    #[test]
    fn wider_analysis_image_scales_by_height_and_centers_x() {
        let geo = ViewGeometry {
            analysis_width: 200,
            analysis_height: 100,
            view_width: 100,
            view_height: 80,
            rotation_degrees: 0,
        };
        // scale = 80/100 = 0.8, offset_x = (100 - 200*0.8)/2 = -30.
        let mapped = geo.map_points(&[Point::new(100.0, 50.0)]);
        assert_eq!(mapped[0], Point::new(100.0 * 0.8 - 30.0, 40.0));
    }

    #[test]
    fn taller_analysis_image_scales_by_width_and_centers_y() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 200,
            view_width: 80,
            view_height: 100,
            rotation_degrees: 0,
        };
        // scale = 80/100 = 0.8, offset_y = (100 - 200*0.8)/2 = -30.
        let mapped = geo.map_points(&[Point::new(50.0, 100.0)]);
        assert_eq!(mapped[0], Point::new(40.0, 100.0 * 0.8 - 30.0));
    }

    #[test]
    fn rotation_90_swaps_into_the_view_box() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 80,
            view_width: 100,
            view_height: 80,
            rotation_degrees: 90,
        };
        // Identity scale, then (x, y) -> (y, view_width - x).
        let mapped = geo.map_points(&[Point::new(10.0, 20.0)]);
        assert_eq!(mapped[0], Point::new(20.0, 90.0));
    }

    #[test]
    fn rotation_180_reflects_both_axes() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 80,
            view_width: 100,
            view_height: 80,
            rotation_degrees: 180,
        };
        let mapped = geo.map_points(&[Point::new(10.0, 20.0)]);
        assert_eq!(mapped[0], Point::new(90.0, 60.0));
    }

    #[test]
    fn rotation_270_is_the_inverse_of_90() {
        let geo = ViewGeometry {
            analysis_width: 100,
            analysis_height: 80,
            view_width: 100,
            view_height: 80,
            rotation_degrees: 270,
        };
        let mapped = geo.map_points(&[Point::new(10.0, 20.0)]);
        assert_eq!(mapped[0], Point::new(60.0, 10.0));
    }
}
