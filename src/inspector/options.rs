//! Parameter types configuring the inspection stages.
//!
//! Defaults reproduce the calibrated reference setup: a fixed camera, lens
//! and working distance where the gear body spans roughly 165 px in radius
//! and the bore 25 px. Every pixel-distance and area threshold below is a
//! calibration constant of that setup and scales with image resolution.

use serde::Deserialize;

use crate::align::AlignOptions;

/// Inspector-wide parameters controlling the multi-stage pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InspectorParams {
    /// Binary threshold separating gear body from background.
    pub mask_threshold: u8,
    /// Hub suppression: radius of the two stamped exclusion disks.
    pub exclusion_radius: i32,
    /// Horizontal offset of the two exclusion-disk centers from the gear
    /// centroid.
    pub exclusion_offset: i32,
    /// 3x3 erosion passes separating touching teeth and defect blobs.
    pub erosion_iterations: u8,
    /// Minimum contour area kept during extraction (noise rejection).
    pub min_contour_area: f64,
    /// Radius of the disk stamped at each defect centroid when probing for
    /// overlapping reference teeth.
    pub footprint_radius: i32,
    pub matching: MatchOptions,
    pub heuristic: ClassifyHeuristic,
    pub diameter: DiameterOptions,
    /// Geometric normalization before comparison. Disabled by default; the
    /// baseline setup keeps samples mechanically registered.
    pub align: Option<AlignOptions>,
}

impl Default for InspectorParams {
    fn default() -> Self {
        Self {
            mask_threshold: 30,
            exclusion_radius: 165,
            exclusion_offset: 6,
            erosion_iterations: 1,
            min_contour_area: 10.0,
            footprint_radius: 22,
            matching: MatchOptions::default(),
            heuristic: ClassifyHeuristic::default(),
            diameter: DiameterOptions::default(),
            align: None,
        }
    }
}

/// How a defect candidate is matched to a reference-tooth footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum MatchRule {
    /// Scan footprints in extraction order, stop at the first centroid
    /// within threshold. Ties resolve by extraction order.
    FirstWithinThreshold,
    /// Pick the closest centroid within threshold.
    Nearest,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Maximum Euclidean centroid distance for a match, in pixels.
    pub max_centroid_distance: f64,
    pub rule: MatchRule,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_centroid_distance: 20.0,
            rule: MatchRule::FirstWithinThreshold,
        }
    }
}

/// Strategy selecting how a localized region is labeled broken vs worn.
#[derive(Clone, Copy, Debug, Deserialize)]
pub enum ClassifyHeuristic {
    /// Area of the candidate relative to its matched reference tooth. Below
    /// `broken_ratio` the tooth is worn; at or above it, broken. Unmatched
    /// candidates stay unclassified.
    AreaRatio { broken_ratio: f64 },
    /// Reference-free shape heuristic for pipelines without a usable tooth
    /// match: large compact blobs are broken teeth, small ragged blobs are
    /// wear marks.
    Shape {
        area_threshold: f64,
        max_broken_aspect: f64,
        min_worn_compactness: f64,
    },
}

impl Default for ClassifyHeuristic {
    fn default() -> Self {
        Self::AreaRatio { broken_ratio: 0.85 }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct DiameterOptions {
    /// Expected bore radius in pixels for the reference setup. Used as a
    /// fallback when the reference image itself yields no bore contour.
    pub bore_reference_radius_px: f64,
    /// Everything farther than this from the gear centroid is suppressed
    /// before searching for the bore contour.
    pub bore_search_radius: i32,
    /// Tolerance band on the bore *area*, as a fraction (0.05 = ±5 %).
    /// Boundary values count as within range.
    pub area_tolerance: f64,
    /// Absolute tolerance on the outer diameter, in pixels.
    pub outer_tolerance_px: f64,
    /// Physical scale of the imaging setup.
    pub mm_per_px: f64,
}

impl Default for DiameterOptions {
    fn default() -> Self {
        Self {
            bore_reference_radius_px: 25.0,
            bore_search_radius: 50,
            area_tolerance: 0.05,
            outer_tolerance_px: 10.0,
            mm_per_px: 0.6,
        }
    }
}
