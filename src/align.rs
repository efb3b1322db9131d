//! Geometric normalization of a sample image into the reference frame.
//!
//! Detects FAST-9 corners in both images, describes each corner with a
//! normalized intensity patch, matches descriptors by mutual nearest
//! neighbour, and fits a projective transform with RANSAC. With fewer than
//! four correspondences the sample is returned unmodified: unaligned
//! comparison is still better than aborting the pipeline.

use image::{GrayImage, Luma};
use imageproc::corners::{corners_fast9, Corner};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use log::{debug, warn};
use nalgebra::Matrix3;
use serde::Deserialize;

use crate::geometry::{fit_homography_ransac, RansacHomographyOptions};
use crate::types::AlignmentStatus;

/// Knobs for keypoint detection, description and the robust fit.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    /// FAST-9 intensity threshold.
    pub fast_threshold: u8,
    /// Strongest corners kept per image.
    pub max_keypoints: usize,
    /// Half-width of the square descriptor patch.
    pub patch_radius: u32,
    pub ransac: RansacHomographyOptions,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            fast_threshold: 35,
            max_keypoints: 400,
            patch_radius: 8,
            ransac: RansacHomographyOptions::default(),
        }
    }
}

/// Result of one alignment invocation.
pub struct AlignOutcome {
    /// The sample resampled into the reference frame, or the unmodified
    /// sample when alignment was underdetermined.
    pub image: GrayImage,
    pub status: AlignmentStatus,
    /// Sample-to-reference transform, when one was fitted.
    pub transform: Option<Matrix3<f64>>,
}

struct Keypoint {
    x: f64,
    y: f64,
    descriptor: Vec<f32>,
}

/// Align `sample` onto `reference`.
pub fn align(reference: &GrayImage, sample: &GrayImage, options: &AlignOptions) -> AlignOutcome {
    let reference_keypoints = detect_and_describe(reference, options);
    let sample_keypoints = detect_and_describe(sample, options);
    let matches = mutual_matches(&sample_keypoints, &reference_keypoints);
    debug!(
        "align: {} reference corners, {} sample corners, {} correspondences",
        reference_keypoints.len(),
        sample_keypoints.len(),
        matches.len()
    );

    if matches.len() < 4 {
        return skipped(sample, matches.len());
    }

    let src: Vec<[f64; 2]> = matches
        .iter()
        .map(|&(s, _, _)| [sample_keypoints[s].x, sample_keypoints[s].y])
        .collect();
    let dst: Vec<[f64; 2]> = matches
        .iter()
        .map(|&(_, r, _)| [reference_keypoints[r].x, reference_keypoints[r].y])
        .collect();

    let Some((h, inliers)) = fit_homography_ransac(&src, &dst, &options.ransac) else {
        warn!("align: robust fit rejected all correspondence sets, comparing unaligned");
        return skipped(sample, matches.len());
    };

    let flat: [f32; 9] = [
        h[(0, 0)] as f32,
        h[(0, 1)] as f32,
        h[(0, 2)] as f32,
        h[(1, 0)] as f32,
        h[(1, 1)] as f32,
        h[(1, 2)] as f32,
        h[(2, 0)] as f32,
        h[(2, 1)] as f32,
        h[(2, 2)] as f32,
    ];
    let Some(projection) = Projection::from_matrix(flat) else {
        warn!("align: fitted transform is not invertible, comparing unaligned");
        return skipped(sample, matches.len());
    };

    let image = warp(sample, &projection, Interpolation::Bilinear, Luma([0u8]));
    AlignOutcome {
        image,
        status: AlignmentStatus::Aligned { inliers },
        transform: Some(h),
    }
}

fn skipped(sample: &GrayImage, correspondences: usize) -> AlignOutcome {
    AlignOutcome {
        image: sample.clone(),
        status: AlignmentStatus::Underdetermined { correspondences },
        transform: None,
    }
}

/// FAST corners plus zero-mean, unit-norm patch descriptors. Corners too
/// close to the border for a full patch are dropped.
fn detect_and_describe(image: &GrayImage, options: &AlignOptions) -> Vec<Keypoint> {
    let mut corners: Vec<Corner> = corners_fast9(image, options.fast_threshold);
    corners.sort_by(|a, b| b.score.total_cmp(&a.score));
    corners.truncate(options.max_keypoints);

    let r = options.patch_radius;
    let (w, h) = image.dimensions();
    corners
        .into_iter()
        .filter(|c| c.x >= r && c.y >= r && c.x + r < w && c.y + r < h)
        .filter_map(|c| {
            patch_descriptor(image, c.x, c.y, r).map(|descriptor| Keypoint {
                x: c.x as f64,
                y: c.y as f64,
                descriptor,
            })
        })
        .collect()
}

fn patch_descriptor(image: &GrayImage, cx: u32, cy: u32, radius: u32) -> Option<Vec<f32>> {
    let side = 2 * radius + 1;
    let mut values = Vec::with_capacity((side * side) as usize);
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            values.push(f32::from(image.get_pixel(x, y).0[0]));
        }
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    for v in &mut values {
        *v -= mean;
    }
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-6 {
        // Featureless patch, useless for matching.
        return None;
    }
    for v in &mut values {
        *v /= norm;
    }
    Some(values)
}

fn descriptor_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Mutual nearest-neighbour correspondences `(sample_idx, reference_idx,
/// distance)`, ranked by descriptor distance ascending.
fn mutual_matches(sample: &[Keypoint], reference: &[Keypoint]) -> Vec<(usize, usize, f32)> {
    if sample.is_empty() || reference.is_empty() {
        return Vec::new();
    }
    let nearest = |from: &[Keypoint], to: &[Keypoint]| -> Vec<(usize, f32)> {
        from.iter()
            .map(|k| {
                let mut best = (0usize, f32::INFINITY);
                for (j, other) in to.iter().enumerate() {
                    let d = descriptor_distance(&k.descriptor, &other.descriptor);
                    if d < best.1 {
                        best = (j, d);
                    }
                }
                best
            })
            .collect()
    };
    let s_to_r = nearest(sample, reference);
    let r_to_s = nearest(reference, sample);

    let mut matches: Vec<(usize, usize, f32)> = s_to_r
        .iter()
        .enumerate()
        .filter(|&(s, &(r, _))| r_to_s[r].0 == s)
        .map(|(s, &(r, d))| (s, r, d))
        .collect();
    matches.sort_by(|a, b| a.2.total_cmp(&b.2));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn scene(offset_x: i32, offset_y: i32) -> GrayImage {
        let mut img = GrayImage::from_pixel(256, 256, Luma([15u8]));
        let rects = [
            (40, 40, 30, 20, 90u8),
            (150, 60, 25, 35, 140),
            (60, 160, 40, 25, 190),
            (160, 170, 30, 30, 240),
        ];
        for &(x, y, w, h, v) in &rects {
            draw_filled_rect_mut(
                &mut img,
                Rect::at(x + offset_x, y + offset_y).of_size(w, h),
                Luma([v]),
            );
        }
        img
    }

    #[test]
    fn featureless_images_fall_back_to_unaligned() {
        let flat_a = GrayImage::from_pixel(128, 128, Luma([10u8]));
        let flat_b = GrayImage::from_pixel(128, 128, Luma([200u8]));
        let outcome = align(&flat_a, &flat_b, &AlignOptions::default());
        assert!(matches!(
            outcome.status,
            AlignmentStatus::Underdetermined { .. }
        ));
        assert!(outcome.transform.is_none());
        assert_eq!(outcome.image.as_raw(), flat_b.as_raw());
    }

    #[test]
    fn translated_scene_is_recovered() {
        let reference = scene(0, 0);
        let sample = scene(7, 4);
        let outcome = align(&reference, &sample, &AlignOptions::default());
        let h = outcome.transform.expect("expected an aligned outcome");
        assert!(matches!(outcome.status, AlignmentStatus::Aligned { .. }));
        assert!((h[(0, 2)] + 7.0).abs() < 1.0, "tx={}", h[(0, 2)]);
        assert!((h[(1, 2)] + 4.0).abs() < 1.0, "ty={}", h[(1, 2)]);

        // The warped sample should agree with the reference away from the
        // border introduced by the shift.
        let warped = outcome.image;
        let mut mismatched = 0usize;
        let mut total = 0usize;
        for y in 20..236u32 {
            for x in 20..236u32 {
                total += 1;
                let a = reference.get_pixel(x, y).0[0] as i16;
                let b = warped.get_pixel(x, y).0[0] as i16;
                if (a - b).abs() > 40 {
                    mismatched += 1;
                }
            }
        }
        assert!(
            mismatched * 100 < total,
            "{mismatched}/{total} pixels differ after warping"
        );
    }
}
