//! Projective estimation and circle fitting used by the aligner and the
//! diameter verifier.
//!
//! Provides a Hartley-normalized DLT homography from ≥4 correspondences, a
//! seeded RANSAC wrapper with a pixel-interpretable inlier threshold, and a
//! minimum enclosing circle (move-to-front incremental construction).

use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Project a 2D point through a 3x3 homography: `H * [x, y, 1]^T -> [u, v]`.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [p[0] / p[2], p[1] / p[2]]
}

/// Reprojection error `||project(H, src) - dst||`.
pub fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

/// Normalizing transform: centroid to origin, mean distance sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

/// Estimate a homography with `dst ≈ project(H, src)` from ≥4 point pairs
/// using the DLT with Hartley normalization. Returns `None` on degenerate
/// input (too few or numerically unusable points).
pub fn estimate_homography_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // The solution is the eigenvector of A^T A with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);
    let mut min_idx = 0;
    let mut min_val = eig.eigenvalues[0].abs();
    for i in 1..9 {
        let v = eig.eigenvalues[i].abs();
        if v < min_val {
            min_val = v;
            min_idx = i;
        }
    }
    let h_norm = Matrix3::from_fn(|r, c| eig.eigenvectors[(3 * r + c, min_idx)]);

    let t_dst_inv = t_dst.try_inverse()?;
    let h = t_dst_inv * h_norm * t_src;

    if h[(2, 2)].abs() < 1e-15 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(h / h[(2, 2)])
}

/// RANSAC parameters for the robust homography fit.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RansacHomographyOptions {
    pub max_iters: usize,
    /// Inlier distance threshold in reference-frame pixels.
    pub inlier_threshold: f64,
    /// Minimum inliers required to accept a model.
    pub min_inliers: usize,
    /// Seed for the sampling rng, fixed for reproducible runs.
    pub seed: u64,
}

impl Default for RansacHomographyOptions {
    fn default() -> Self {
        Self {
            max_iters: 500,
            inlier_threshold: 5.0,
            min_inliers: 4,
            seed: 7,
        }
    }
}

/// Robust homography from correspondences, `dst ≈ H * src`.
///
/// Samples 4-point minimal subsets, keeps the model with the most inliers
/// and refits on the full inlier set. Returns the model and its inlier
/// count, or `None` when no model reaches `min_inliers`.
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    options: &RansacHomographyOptions,
) -> Option<(Matrix3<f64>, usize)> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut best_count = 0usize;
    let mut best_mask = vec![false; n];

    for _ in 0..options.max_iters {
        let sample = sample_indices(&mut rng, n, 4);
        let s: Vec<[f64; 2]> = sample.iter().map(|&i| src[i]).collect();
        let d: Vec<[f64; 2]> = sample.iter().map(|&i| dst[i]).collect();
        let Some(h) = estimate_homography_dlt(&s, &d) else {
            continue;
        };

        let mut count = 0usize;
        let mut mask = vec![false; n];
        for i in 0..n {
            if reprojection_error(&h, src[i], dst[i]) < options.inlier_threshold {
                mask[i] = true;
                count += 1;
            }
        }
        if count > best_count {
            best_count = count;
            best_mask = mask;
            // Early exit once the consensus is overwhelming.
            if best_count * 10 > n * 9 {
                break;
            }
        }
    }

    if best_count < options.min_inliers {
        return None;
    }

    let inlier_src: Vec<[f64; 2]> = best_mask
        .iter()
        .zip(src)
        .filter(|(&m, _)| m)
        .map(|(_, &p)| p)
        .collect();
    let inlier_dst: Vec<[f64; 2]> = best_mask
        .iter()
        .zip(dst)
        .filter(|(&m, _)| m)
        .map(|(_, &p)| p)
        .collect();
    let h = estimate_homography_dlt(&inlier_src, &inlier_dst)?;

    let final_count = (0..n)
        .filter(|&i| reprojection_error(&h, src[i], dst[i]) < options.inlier_threshold)
        .count();
    Some((h, final_count))
}

fn sample_indices(rng: &mut StdRng, n: usize, k: usize) -> Vec<usize> {
    let mut picked = Vec::with_capacity(k);
    while picked.len() < k {
        let idx = rng.gen_range(0..n);
        if !picked.contains(&idx) {
            picked.push(idx);
        }
    }
    picked
}

/// A circle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: [f64; 2],
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: [f64; 2]) -> bool {
        let dx = p[0] - self.center[0];
        let dy = p[1] - self.center[1];
        (dx * dx + dy * dy).sqrt() <= self.radius + 1e-7
    }

    fn from_two(a: [f64; 2], b: [f64; 2]) -> Self {
        let center = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        Self {
            center,
            radius: (dx * dx + dy * dy).sqrt() / 2.0,
        }
    }

    /// Circumcircle of three points; falls back to the widest two-point
    /// circle when the points are (near-)collinear.
    fn from_three(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Self {
        let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
        if d.abs() < 1e-9 {
            let ab = Self::from_two(a, b);
            let ac = Self::from_two(a, c);
            let bc = Self::from_two(b, c);
            let mut widest = ab;
            if ac.radius > widest.radius {
                widest = ac;
            }
            if bc.radius > widest.radius {
                widest = bc;
            }
            return widest;
        }
        let a2 = a[0] * a[0] + a[1] * a[1];
        let b2 = b[0] * b[0] + b[1] * b[1];
        let c2 = c[0] * c[0] + c[1] * c[1];
        let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
        let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
        let dx = a[0] - ux;
        let dy = a[1] - uy;
        Self {
            center: [ux, uy],
            radius: (dx * dx + dy * dy).sqrt(),
        }
    }
}

/// Minimum enclosing circle of a point set (expected linear time after a
/// seeded shuffle). Returns `None` for an empty set.
pub fn min_enclosing_circle(points: &[[f64; 2]]) -> Option<Circle> {
    if points.is_empty() {
        return None;
    }
    let mut pts = points.to_vec();
    let mut rng = StdRng::seed_from_u64(11);
    pts.shuffle(&mut rng);

    let mut circle = Circle {
        center: pts[0],
        radius: 0.0,
    };
    for i in 1..pts.len() {
        if circle.contains(pts[i]) {
            continue;
        }
        circle = Circle {
            center: pts[i],
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(pts[j]) {
                continue;
            }
            circle = Circle::from_two(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(pts[k]) {
                    circle = Circle::from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(circle)
}
