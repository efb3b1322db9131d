//! Shared result types produced by the inspection pipeline.

use serde::Serialize;
use std::fmt;

/// Integer pixel coordinates of a contour or mask centroid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CentroidPoint {
    pub x: i32,
    pub y: i32,
}

impl CentroidPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another centroid.
    pub fn distance_to(&self, other: CentroidPoint) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Classification assigned to a localized defect region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DefectLabel {
    Broken,
    Worn,
    Unclassified,
}

impl fmt::Display for DefectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broken => write!(f, "broken"),
            Self::Worn => write!(f, "worn"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Outcome of a diameter check against its tolerance band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiameterStatus {
    Smaller,
    Larger,
    /// Within the tolerance band. Boundary values count as within range.
    Identical,
    /// The bore contour was absent (closed or blocked opening).
    NoOpeningDetected,
    /// The mask produced no contour to measure at all.
    NoContoursFound,
}

impl fmt::Display for DiameterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smaller => write!(f, "Smaller"),
            Self::Larger => write!(f, "Larger"),
            Self::Identical => write!(f, "Identical"),
            Self::NoOpeningDetected => write!(f, "No opening detected"),
            Self::NoContoursFound => write!(f, "No contours found"),
        }
    }
}

/// A measured diameter with its classification.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DiameterMeasurement {
    pub diameter_px: f64,
    pub diameter_mm: f64,
    pub status: DiameterStatus,
}

impl DiameterMeasurement {
    pub fn absent(status: DiameterStatus) -> Self {
        Self {
            diameter_px: 0.0,
            diameter_mm: 0.0,
            status,
        }
    }
}

/// A classified defect region, reduced to its serializable attributes.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LabeledDefect {
    pub centroid: CentroidPoint,
    pub area: f64,
    /// Index into the matched reference-tooth footprint list, if any.
    pub matched_tooth: Option<usize>,
    pub label: DefectLabel,
}

/// Running tallies over the classified regions. Unclassified regions are
/// excluded from both counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DefectTally {
    pub broken: usize,
    pub worn: usize,
}

/// How the sample was brought into the reference frame, if at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AlignmentStatus {
    /// Alignment was not requested for this run.
    Disabled,
    /// Fewer than four correspondences; the sample was compared unaligned.
    Underdetermined { correspondences: usize },
    /// The sample was warped into the reference frame.
    Aligned { inliers: usize },
}

/// Immutable per-sample inspection result.
#[derive(Clone, Debug, Serialize)]
pub struct InspectionReport {
    pub sample_id: String,
    pub defects: Vec<LabeledDefect>,
    pub broken_count: usize,
    pub worn_count: usize,
    pub inner_diameter: DiameterMeasurement,
    pub outer_diameter: DiameterMeasurement,
    pub alignment: AlignmentStatus,
    pub summary: String,
}
