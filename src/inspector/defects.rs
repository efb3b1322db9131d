//! Differential defect localization.
//!
//! Candidate defect pixels are the symmetric difference of the reference and
//! sample masks. After hub suppression and erosion, each candidate blob is
//! dilated into a fixed-radius footprint disk; intersecting the footprint
//! mask with the eroded reference-teeth mask isolates exactly the reference
//! teeth that overlap a candidate, which are then matched by centroid
//! distance.

use log::{debug, warn};

use crate::contour::{extract_contours, GearContour};
use crate::error::Result;
use crate::inspector::options::{InspectorParams, MatchRule};
use crate::mask::{suppress_hub, BinaryMask};
use crate::types::CentroidPoint;

/// A contour from the differential mask, optionally tagged with the
/// reference-tooth footprint it was matched to.
#[derive(Clone, Debug)]
pub struct DefectCandidate {
    pub contour: GearContour,
    pub centroid: CentroidPoint,
    /// Index into [`DefectLocalization::matched_teeth`].
    pub matched_tooth: Option<usize>,
}

/// Output of one localization pass.
#[derive(Clone, Debug)]
pub struct DefectLocalization {
    pub candidates: Vec<DefectCandidate>,
    /// Reference-tooth footprints overlapping any candidate, in extraction
    /// order.
    pub matched_teeth: Vec<GearContour>,
    /// The eroded differential mask with candidate footprints stamped in,
    /// kept for annotation output.
    pub diff_mask: BinaryMask,
}

/// Localize defect regions by differencing `sample_mask` against
/// `reference_mask` and matching the resulting blobs to reference teeth.
///
/// An empty candidate set or an empty teeth mask yields an empty result,
/// not an error.
pub fn localize_defects(
    reference_mask: &BinaryMask,
    sample_mask: &BinaryMask,
    reference_teeth_mask: &BinaryMask,
    gear_centroid: CentroidPoint,
    params: &InspectorParams,
) -> Result<DefectLocalization> {
    let mut difference = reference_mask.xor(sample_mask)?;
    suppress_hub(
        &mut difference,
        gear_centroid,
        params.exclusion_radius,
        params.exclusion_offset,
    );
    let mut diff_eroded = difference.erode(params.erosion_iterations);

    let mut candidates = Vec::new();
    for contour in extract_contours(&diff_eroded, params.min_contour_area) {
        match contour.centroid() {
            Ok(centroid) => candidates.push(DefectCandidate {
                contour,
                centroid,
                matched_tooth: None,
            }),
            // Guarded division: skip the offending contour, keep the rest.
            Err(_) => warn!("skipping degenerate defect contour"),
        }
    }
    debug!("localize: {} defect candidates", candidates.len());

    // Stamp each candidate's footprint disk, then keep only the reference
    // teeth under a footprint.
    for candidate in &candidates {
        diff_eroded.stamp_disk(candidate.centroid, params.footprint_radius, true);
    }
    let teeth_under_footprints = diff_eroded.and(reference_teeth_mask)?;
    let matched_teeth = extract_contours(&teeth_under_footprints, params.min_contour_area);

    let tooth_centroids: Vec<Option<CentroidPoint>> = matched_teeth
        .iter()
        .map(|t| t.centroid().ok())
        .collect();

    for candidate in &mut candidates {
        candidate.matched_tooth = match_candidate(
            candidate.centroid,
            &tooth_centroids,
            params.matching.max_centroid_distance,
            params.matching.rule,
        );
    }

    Ok(DefectLocalization {
        candidates,
        matched_teeth,
        diff_mask: diff_eroded,
    })
}

/// Match one candidate centroid against the footprint centroids.
///
/// `FirstWithinThreshold` preserves the historical behavior: footprints are
/// scanned in extraction order and the scan stops at the first centroid
/// within threshold. `Nearest` picks the minimum distance instead. A
/// centroid farther than the threshold from every footprint stays unmatched
/// under either rule.
fn match_candidate(
    centroid: CentroidPoint,
    tooth_centroids: &[Option<CentroidPoint>],
    max_distance: f64,
    rule: MatchRule,
) -> Option<usize> {
    match rule {
        MatchRule::FirstWithinThreshold => tooth_centroids.iter().position(|tc| {
            tc.map(|tc| centroid.distance_to(tc) < max_distance)
                .unwrap_or(false)
        }),
        MatchRule::Nearest => tooth_centroids
            .iter()
            .enumerate()
            .filter_map(|(i, tc)| tc.map(|tc| (i, centroid.distance_to(tc))))
            .filter(|&(_, d)| d < max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i),
    }
}
