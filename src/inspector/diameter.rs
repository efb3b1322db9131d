//! Inner-opening and outer-diameter verification.
//!
//! The bore is isolated with an inverted-polarity mask and a disk-shaped
//! suppression around the expected center; its size is reported as the
//! equivalent-circle diameter of the surviving contour area. The outer
//! diameter comes from the minimum enclosing circle of the outermost gear
//! contour.

use image::GrayImage;
use log::debug;

use crate::contour::{extract_contours, largest_contour};
use crate::error::Result;
use crate::geometry::min_enclosing_circle;
use crate::inspector::options::DiameterOptions;
use crate::mask::{BinaryMask, ThresholdPolarity};
use crate::types::{CentroidPoint, DiameterMeasurement, DiameterStatus};

/// Measure the bore area of `image`, or `None` when no bore contour
/// survives the suppression (closed or blocked opening).
pub fn bore_area(
    image: &GrayImage,
    gear_centroid: CentroidPoint,
    mask_threshold: u8,
    options: &DiameterOptions,
) -> Result<Option<f64>> {
    let mut mask = BinaryMask::from_image(image, mask_threshold, ThresholdPolarity::Inverted)?;
    mask.keep_disk(gear_centroid, options.bore_search_radius);
    Ok(largest_contour(extract_contours(&mask, 1.0)).map(|c| c.area()))
}

/// Verify the inner opening against the reference bore area with a ±`tol`
/// band on area. Boundary values count as within range.
pub fn verify_inner_diameter(
    image: &GrayImage,
    gear_centroid: CentroidPoint,
    mask_threshold: u8,
    reference_area: f64,
    options: &DiameterOptions,
) -> Result<DiameterMeasurement> {
    let Some(area) = bore_area(image, gear_centroid, mask_threshold, options)? else {
        debug!("inner diameter: no bore contour detected");
        return Ok(DiameterMeasurement::absent(
            DiameterStatus::NoOpeningDetected,
        ));
    };

    let radius = (area / std::f64::consts::PI).sqrt();
    let diameter_px = 2.0 * radius;
    let status = band_status(area, reference_area, options.area_tolerance);

    Ok(DiameterMeasurement {
        diameter_px,
        diameter_mm: diameter_px * options.mm_per_px,
        status,
    })
}

/// Classify `area` against the symmetric tolerance band around
/// `reference_area`. Values exactly on a band edge count as within range.
fn band_status(area: f64, reference_area: f64, tolerance: f64) -> DiameterStatus {
    let lower = reference_area * (1.0 - tolerance);
    let upper = reference_area * (1.0 + tolerance);
    if area < lower {
        DiameterStatus::Smaller
    } else if area > upper {
        DiameterStatus::Larger
    } else {
        DiameterStatus::Identical
    }
}

/// Radius of the minimum enclosing circle of the outermost contour of
/// `mask`, or `None` when the mask has no contour.
pub fn outer_radius(mask: &BinaryMask, min_contour_area: f64) -> Option<f64> {
    let contour = largest_contour(extract_contours(mask, min_contour_area))?;
    let points: Vec<[f64; 2]> = contour
        .points()
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();
    min_enclosing_circle(&points).map(|c| c.radius)
}

/// Verify the outer diameter against the reference by absolute pixel
/// difference.
pub fn verify_outer_diameter(
    sample_mask: &BinaryMask,
    min_contour_area: f64,
    reference_radius_px: f64,
    options: &DiameterOptions,
) -> DiameterMeasurement {
    let Some(radius) = outer_radius(sample_mask, min_contour_area) else {
        debug!("outer diameter: no gear contour detected");
        return DiameterMeasurement::absent(DiameterStatus::NoContoursFound);
    };

    let diameter_px = 2.0 * radius;
    let reference_diameter = 2.0 * reference_radius_px;
    let status = if (diameter_px - reference_diameter).abs() <= options.outer_tolerance_px {
        DiameterStatus::Identical
    } else if diameter_px > reference_diameter {
        DiameterStatus::Larger
    } else {
        DiameterStatus::Smaller
    };

    DiameterMeasurement {
        diameter_px,
        diameter_mm: diameter_px * options.mm_per_px,
        status,
    }
}
