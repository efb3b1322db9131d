//! Contour extraction and moment-based attributes.
//!
//! Wraps the `imageproc` border tracer and derives per-contour area,
//! perimeter, bounding box and centroid from the polygon moments. Only outer
//! (non-nested) boundaries are kept, in the tracer's raster order, which is
//! stable across runs.

use imageproc::contours::find_contours;
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::error::{InspectError, Result};
use crate::mask::BinaryMask;
use crate::types::CentroidPoint;

/// A traced boundary of a connected mask region with cached moments.
#[derive(Clone, Debug)]
pub struct GearContour {
    points: Vec<Point<i32>>,
    /// Signed shoelace area (m00). Positive or negative depending on winding.
    m00: f64,
    m10: f64,
    m01: f64,
    perimeter: f64,
    bbox: Rect,
}

impl GearContour {
    /// Build a contour from traced boundary points, computing the polygon
    /// moments via Green's theorem.
    pub fn from_points(points: Vec<Point<i32>>) -> Self {
        let n = points.len();
        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;
        let mut perimeter = 0.0;
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (px, py) = (p.x as f64, p.y as f64);
            let (qx, qy) = (q.x as f64, q.y as f64);
            let cross = px * qy - qx * py;
            m00 += cross;
            m10 += (px + qx) * cross;
            m01 += (py + qy) * cross;
            perimeter += ((qx - px).powi(2) + (qy - py).powi(2)).sqrt();
        }
        m00 *= 0.5;
        m10 /= 6.0;
        m01 /= 6.0;

        let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
        let bbox = Rect::at(min_x, min_y).of_size(
            (max_x - min_x + 1).max(1) as u32,
            (max_y - min_y + 1).max(1) as u32,
        );

        Self {
            points,
            m00,
            m10,
            m01,
            perimeter,
            bbox,
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Unsigned planar area.
    pub fn area(&self) -> f64 {
        self.m00.abs()
    }

    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    /// Bounding-box aspect ratio, always `>= 1`.
    pub fn aspect_ratio(&self) -> f64 {
        let w = self.bbox.width() as f64;
        let h = self.bbox.height() as f64;
        w.max(h) / w.min(h).max(1.0)
    }

    /// Centroid from the zeroth and first moments: `(m10/m00, m01/m00)`.
    ///
    /// Fails with `DegenerateContour` when `m00 == 0` (single points,
    /// straight runs) so the division is never performed on a zero
    /// denominator.
    pub fn centroid(&self) -> Result<CentroidPoint> {
        if self.m00.abs() < f64::EPSILON {
            return Err(InspectError::DegenerateContour);
        }
        Ok(CentroidPoint::new(
            (self.m10 / self.m00) as i32,
            (self.m01 / self.m00) as i32,
        ))
    }
}

/// Extract the outer contours of `mask`, skipping blobs below `min_area`.
///
/// Degenerate blobs (zero shoelace area) are dropped here as well, so every
/// returned contour has a well-defined centroid. An empty result is a valid
/// outcome, not an error.
pub fn extract_contours(mask: &BinaryMask, min_area: f64) -> Vec<GearContour> {
    find_contours::<i32>(mask.as_image())
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|c| GearContour::from_points(c.points))
        .filter(|c| c.area() >= min_area.max(f64::EPSILON))
        .collect()
}

/// The contour with the largest area, typically the outermost boundary.
pub fn largest_contour(contours: Vec<GearContour>) -> Option<GearContour> {
    contours
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CentroidPoint as Cp;
    use image::GrayImage;

    fn disk_mask(w: u32, h: u32, cx: i32, cy: i32, r: i32) -> BinaryMask {
        let mut m = BinaryMask::from_binary_image(GrayImage::new(w, h));
        m.stamp_disk(Cp::new(cx, cy), r, true);
        m
    }

    #[test]
    fn disk_area_and_centroid_are_recovered() {
        let r = 80.0f64;
        let mask = disk_mask(400, 400, 200, 190, r as i32);
        let contours = extract_contours(&mask, 1.0);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];

        let expected = std::f64::consts::PI * r * r;
        let rel_err = (contour.area() - expected).abs() / expected;
        assert!(rel_err < 0.02, "area {} vs {expected}", contour.area());

        let c = contour.centroid().unwrap();
        assert!((c.x - 200).abs() <= 1, "cx={}", c.x);
        assert!((c.y - 190).abs() <= 1, "cy={}", c.y);
    }

    #[test]
    fn degenerate_contour_fails_explicitly() {
        // A single pixel traces to a single point with zero shoelace area.
        let contour = GearContour::from_points(vec![imageproc::point::Point::new(5, 5)]);
        assert!(matches!(
            contour.centroid().unwrap_err(),
            InspectError::DegenerateContour
        ));
    }

    #[test]
    fn degenerate_blobs_are_filtered_out() {
        let mut img = GrayImage::new(32, 32);
        img.put_pixel(10, 10, image::Luma([255]));
        let m = BinaryMask::from_binary_image(img);
        assert!(extract_contours(&m, 1.0).is_empty());
    }

    #[test]
    fn min_area_filter_rejects_noise() {
        let mut m = disk_mask(128, 128, 40, 40, 12);
        m.stamp_disk(Cp::new(100, 100), 2, true);
        let all = extract_contours(&m, 1.0);
        assert_eq!(all.len(), 2);
        let filtered = extract_contours(&m, 50.0);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn extraction_order_is_stable() {
        let mut m = BinaryMask::from_binary_image(GrayImage::new(128, 128));
        m.stamp_disk(Cp::new(30, 90), 8, true);
        m.stamp_disk(Cp::new(90, 30), 8, true);
        let a: Vec<_> = extract_contours(&m, 1.0)
            .iter()
            .map(|c| c.centroid().unwrap())
            .collect();
        let b: Vec<_> = extract_contours(&m, 1.0)
            .iter()
            .map(|c| c.centroid().unwrap())
            .collect();
        assert_eq!(a, b);
        // Raster order: the blob whose boundary starts higher comes first.
        assert!(a[0].y < a[1].y);
    }
}
