//! Broken/worn classification of localized defect regions.

use crate::contour::GearContour;
use crate::inspector::defects::DefectLocalization;
use crate::inspector::options::ClassifyHeuristic;
use crate::types::{DefectLabel, DefectTally, LabeledDefect};

/// Label every candidate and tally the broken/worn counts. Unclassified
/// regions are reported but excluded from the tallies.
pub fn classify_defects(
    localization: &DefectLocalization,
    heuristic: &ClassifyHeuristic,
) -> (Vec<LabeledDefect>, DefectTally) {
    let mut labeled = Vec::with_capacity(localization.candidates.len());
    let mut tally = DefectTally::default();

    for candidate in &localization.candidates {
        let label = classify_one(
            &candidate.contour,
            candidate
                .matched_tooth
                .and_then(|i| localization.matched_teeth.get(i)),
            heuristic,
        );
        match label {
            DefectLabel::Broken => tally.broken += 1,
            DefectLabel::Worn => tally.worn += 1,
            DefectLabel::Unclassified => {}
        }
        labeled.push(LabeledDefect {
            centroid: candidate.centroid,
            area: candidate.contour.area(),
            matched_tooth: candidate.matched_tooth,
            label,
        });
    }
    (labeled, tally)
}

/// Classify a single region.
///
/// The area-ratio heuristic compares the candidate to its matched reference
/// tooth: a small ratio means most of the tooth is still present (wear), a
/// ratio at or above the cut-off means the tooth is mostly or fully missing
/// (broken). The boundary value classifies as broken, so the ratio axis
/// crosses exactly one worn-to-broken transition.
pub fn classify_one(
    candidate: &GearContour,
    matched_tooth: Option<&GearContour>,
    heuristic: &ClassifyHeuristic,
) -> DefectLabel {
    match *heuristic {
        ClassifyHeuristic::AreaRatio { broken_ratio } => match matched_tooth {
            Some(tooth) if tooth.area() > 0.0 => {
                if candidate.area() / tooth.area() < broken_ratio {
                    DefectLabel::Worn
                } else {
                    DefectLabel::Broken
                }
            }
            _ => DefectLabel::Unclassified,
        },
        ClassifyHeuristic::Shape {
            area_threshold,
            max_broken_aspect,
            min_worn_compactness,
        } => {
            let area = candidate.area();
            if area > area_threshold && candidate.aspect_ratio() < max_broken_aspect {
                DefectLabel::Broken
            } else if area > 0.0
                && area < area_threshold
                && candidate.perimeter() / area > min_worn_compactness
            {
                DefectLabel::Worn
            } else {
                DefectLabel::Unclassified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::point::Point;

    /// Axis-aligned rectangle contour with the given corner span.
    fn rect_contour(w: i32, h: i32) -> GearContour {
        GearContour::from_points(vec![
            Point::new(0, 0),
            Point::new(w, 0),
            Point::new(w, h),
            Point::new(0, h),
        ])
    }

    #[test]
    fn ratio_is_monotonic_with_single_transition() {
        let heuristic = ClassifyHeuristic::AreaRatio { broken_ratio: 0.85 };
        let tooth = rect_contour(100, 100);
        let mut transitions = 0;
        let mut last = None;
        for w in 1..=100 {
            let candidate = rect_contour(w, 100);
            let label = classify_one(&candidate, Some(&tooth), &heuristic);
            assert_ne!(label, DefectLabel::Unclassified);
            if let Some(prev) = last {
                if prev != label {
                    transitions += 1;
                    assert_eq!(prev, DefectLabel::Worn);
                    assert_eq!(label, DefectLabel::Broken);
                }
            }
            last = Some(label);
        }
        assert_eq!(transitions, 1);
    }

    #[test]
    fn boundary_ratio_classifies_as_broken() {
        let heuristic = ClassifyHeuristic::AreaRatio { broken_ratio: 0.85 };
        let tooth = rect_contour(100, 100);
        let candidate = rect_contour(85, 100);
        assert_eq!(
            classify_one(&candidate, Some(&tooth), &heuristic),
            DefectLabel::Broken
        );
    }

    #[test]
    fn unmatched_regions_stay_unclassified() {
        let heuristic = ClassifyHeuristic::AreaRatio { broken_ratio: 0.85 };
        let candidate = rect_contour(50, 50);
        assert_eq!(
            classify_one(&candidate, None, &heuristic),
            DefectLabel::Unclassified
        );
    }

    #[test]
    fn shape_heuristic_splits_by_area_and_compactness() {
        let heuristic = ClassifyHeuristic::Shape {
            area_threshold: 1500.0,
            max_broken_aspect: 1.5,
            min_worn_compactness: 0.2,
        };
        // Large, roughly square region: broken tooth.
        assert_eq!(
            classify_one(&rect_contour(50, 50), None, &heuristic),
            DefectLabel::Broken
        );
        // Small ragged sliver: wear mark.
        assert_eq!(
            classify_one(&rect_contour(30, 2), None, &heuristic),
            DefectLabel::Worn
        );
        // Large but elongated region stays unclassified.
        assert_eq!(
            classify_one(&rect_contour(200, 20), None, &heuristic),
            DefectLabel::Unclassified
        );
    }
}
