//! Binary silhouette masks and the pixel-wise operations the pipeline
//! composes them with.
//!
//! A [`BinaryMask`] is a grayscale buffer restricted to {0, 255}. Masks are
//! produced by thresholding a grayscale image and then manipulated with
//! XOR/AND combination, morphological erosion and disk stamping. All
//! operations are pure functions of their inputs.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::distance_transform::Norm;
use imageproc::morphology::erode;
use serde::{Deserialize, Serialize};

use crate::error::{InspectError, Result};
use crate::types::CentroidPoint;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Selects which side of the threshold maps to foreground.
///
/// `Inverted` is required for inner-opening detection, where the bore is
/// darker than the gear body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolarity {
    /// Pixels `>= threshold` become foreground.
    Normal,
    /// Pixels `>= threshold` become background.
    Inverted,
}

/// A two-level mask derived from a grayscale image.
#[derive(Clone, Debug)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// Threshold `image` into a binary mask.
    ///
    /// Fails with `InvalidImage` when the input has zero dimensions.
    pub fn from_image(
        image: &GrayImage,
        threshold: u8,
        polarity: ThresholdPolarity,
    ) -> Result<Self> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(InspectError::InvalidImage(format!(
                "cannot threshold a {w}x{h} image"
            )));
        }
        let (fg, bg) = match polarity {
            ThresholdPolarity::Normal => (FOREGROUND, BACKGROUND),
            ThresholdPolarity::Inverted => (BACKGROUND, FOREGROUND),
        };
        let mut out = GrayImage::new(w, h);
        for (src, dst) in image.pixels().zip(out.pixels_mut()) {
            dst.0[0] = if src.0[0] >= threshold { fg } else { bg };
        }
        Ok(Self { image: out })
    }

    /// Wrap an already-binary buffer. Any nonzero pixel is normalized to 255.
    pub fn from_binary_image(image: GrayImage) -> Self {
        let mut image = image;
        for p in image.pixels_mut() {
            p.0[0] = if p.0[0] > 0 { FOREGROUND } else { BACKGROUND };
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Pixel-wise symmetric difference. Differing pixels become foreground.
    pub fn xor(&self, other: &BinaryMask) -> Result<BinaryMask> {
        self.check_same_size(other, "xor")?;
        let mut out = GrayImage::new(self.width(), self.height());
        for ((a, b), dst) in self
            .image
            .pixels()
            .zip(other.image.pixels())
            .zip(out.pixels_mut())
        {
            dst.0[0] = if a.0[0] != b.0[0] { FOREGROUND } else { BACKGROUND };
        }
        Ok(BinaryMask { image: out })
    }

    /// Pixel-wise intersection.
    pub fn and(&self, other: &BinaryMask) -> Result<BinaryMask> {
        self.check_same_size(other, "and")?;
        let mut out = GrayImage::new(self.width(), self.height());
        for ((a, b), dst) in self
            .image
            .pixels()
            .zip(other.image.pixels())
            .zip(out.pixels_mut())
        {
            dst.0[0] = if a.0[0] == FOREGROUND && b.0[0] == FOREGROUND {
                FOREGROUND
            } else {
                BACKGROUND
            };
        }
        Ok(BinaryMask { image: out })
    }

    /// Morphological erosion with a 3x3 structuring element applied
    /// `iterations` times. Zero iterations returns a copy.
    pub fn erode(&self, iterations: u8) -> BinaryMask {
        if iterations == 0 {
            return self.clone();
        }
        // n passes of a 3x3 L-inf erosion equal one pass with radius n.
        BinaryMask {
            image: erode(&self.image, Norm::LInf, iterations),
        }
    }

    /// Stamp a filled disk of foreground or background over the mask.
    pub fn stamp_disk(&mut self, center: CentroidPoint, radius: i32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { BACKGROUND };
        draw_filled_circle_mut(&mut self.image, (center.x, center.y), radius, Luma([value]));
    }

    /// Zero out every pixel farther than `radius` from `center`, keeping only
    /// the disk of interest (the bore-search suppression of everything
    /// outside a narrow region around the expected opening).
    pub fn keep_disk(&mut self, center: CentroidPoint, radius: i32) {
        let r2 = i64::from(radius) * i64::from(radius);
        for (x, y, p) in self.image.enumerate_pixels_mut() {
            let dx = i64::from(x as i32 - center.x);
            let dy = i64::from(y as i32 - center.y);
            if dx * dx + dy * dy > r2 {
                p.0[0] = BACKGROUND;
            }
        }
    }

    /// Pixel-mass centroid of the mask from its zeroth and first moments.
    ///
    /// Fails with `DegenerateContour` when the mask has no foreground.
    pub fn centroid(&self) -> Result<CentroidPoint> {
        let mut m00 = 0u64;
        let mut m10 = 0u64;
        let mut m01 = 0u64;
        for (x, y, p) in self.image.enumerate_pixels() {
            if p.0[0] == FOREGROUND {
                m00 += 1;
                m10 += u64::from(x);
                m01 += u64::from(y);
            }
        }
        if m00 == 0 {
            return Err(InspectError::DegenerateContour);
        }
        Ok(CentroidPoint::new(
            (m10 / m00) as i32,
            (m01 / m00) as i32,
        ))
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    fn check_same_size(&self, other: &BinaryMask, op: &str) -> Result<()> {
        if self.image.dimensions() != other.image.dimensions() {
            return Err(InspectError::InvalidImage(format!(
                "{op}: mask dimensions differ ({}x{} vs {}x{})",
                self.width(),
                self.height(),
                other.width(),
                other.height()
            )));
        }
        Ok(())
    }
}

/// Suppress the hub/inner-diameter area with two overlapping filled disks
/// centered on the gear centroid, offset horizontally by `center_offset`.
/// Leaves only the tooth ring of the silhouette.
pub fn suppress_hub(mask: &mut BinaryMask, centroid: CentroidPoint, radius: i32, center_offset: i32) {
    mask.stamp_disk(
        CentroidPoint::new(centroid.x - center_offset, centroid.y),
        radius,
        false,
    );
    mask.stamp_disk(
        CentroidPoint::new(centroid.x + center_offset, centroid.y),
        radius,
        false,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(w: u32, h: u32) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for (x, _, p) in img.enumerate_pixels_mut() {
            p.0[0] = (x * 255 / w.max(1)) as u8;
        }
        img
    }

    #[test]
    fn threshold_polarity_flips_foreground() {
        let img = gradient_image(64, 8);
        let normal = BinaryMask::from_image(&img, 128, ThresholdPolarity::Normal).unwrap();
        let inverted = BinaryMask::from_image(&img, 128, ThresholdPolarity::Inverted).unwrap();
        let total = (64 * 8) as usize;
        assert_eq!(
            normal.foreground_count() + inverted.foreground_count(),
            total
        );
        assert!(normal.foreground_count() > 0);
        assert!(inverted.foreground_count() > 0);
    }

    #[test]
    fn zero_dimension_image_is_rejected() {
        let img = GrayImage::new(0, 10);
        let err = BinaryMask::from_image(&img, 30, ThresholdPolarity::Normal).unwrap_err();
        assert!(matches!(err, InspectError::InvalidImage(_)));
    }

    #[test]
    fn xor_marks_exactly_the_differing_pixels() {
        let mut a = BinaryMask::from_binary_image(GrayImage::new(32, 32));
        let mut b = BinaryMask::from_binary_image(GrayImage::new(32, 32));
        a.stamp_disk(CentroidPoint::new(16, 16), 8, true);
        b.stamp_disk(CentroidPoint::new(16, 16), 8, true);
        b.stamp_disk(CentroidPoint::new(16, 16), 4, false);
        let diff = a.xor(&b).unwrap();
        // The difference is the inner disk that was removed from `b`.
        assert_eq!(diff.foreground_count(), {
            let mut inner = BinaryMask::from_binary_image(GrayImage::new(32, 32));
            inner.stamp_disk(CentroidPoint::new(16, 16), 4, true);
            inner.foreground_count()
        });
    }

    #[test]
    fn xor_rejects_mismatched_dimensions() {
        let a = BinaryMask::from_binary_image(GrayImage::new(8, 8));
        let b = BinaryMask::from_binary_image(GrayImage::new(9, 8));
        assert!(a.xor(&b).is_err());
    }

    #[test]
    fn centroid_of_offset_disk() {
        let mut m = BinaryMask::from_binary_image(GrayImage::new(100, 100));
        m.stamp_disk(CentroidPoint::new(70, 40), 12, true);
        let c = m.centroid().unwrap();
        assert!((c.x - 70).abs() <= 1, "cx={}", c.x);
        assert!((c.y - 40).abs() <= 1, "cy={}", c.y);
    }

    #[test]
    fn centroid_of_empty_mask_is_degenerate() {
        let m = BinaryMask::from_binary_image(GrayImage::new(10, 10));
        assert!(matches!(
            m.centroid().unwrap_err(),
            InspectError::DegenerateContour
        ));
    }

    #[test]
    fn erosion_shrinks_foreground() {
        let mut m = BinaryMask::from_binary_image(GrayImage::new(64, 64));
        m.stamp_disk(CentroidPoint::new(32, 32), 10, true);
        let before = m.foreground_count();
        let eroded = m.erode(1);
        assert!(eroded.foreground_count() < before);
        assert!(eroded.foreground_count() > 0);
    }

    #[test]
    fn keep_disk_clears_outside() {
        let mut m = BinaryMask::from_binary_image(GrayImage::new(64, 64));
        for p in m.image.pixels_mut() {
            p.0[0] = FOREGROUND;
        }
        m.keep_disk(CentroidPoint::new(32, 32), 5);
        let kept = m.foreground_count();
        assert!(kept > 0 && kept < 64 * 64);
        assert_eq!(m.as_image().get_pixel(0, 0).0[0], BACKGROUND);
        assert_eq!(m.as_image().get_pixel(32, 32).0[0], FOREGROUND);
    }
}
