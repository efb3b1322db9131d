//! Gear inspector orchestrating the full comparison pipeline.
//!
//! Overview
//! - Processes the reference image once into an immutable
//!   [`ReferenceArtifacts`] snapshot: silhouette mask, gear centroid, eroded
//!   teeth-only mask, bore area and outer radius.
//! - Each sample is evaluated independently against that snapshot:
//!   optional alignment into the reference frame, mask construction,
//!   differential defect localization, broken/worn classification and the
//!   two diameter checks, assembled into an [`InspectionReport`].
//! - Samples share the snapshot read-only, so independent samples may be
//!   inspected from parallel workers without locking.
//!
//! Modules
//! - [`options`] – configuration types used by the inspector and CLI.
//! - [`defects`] – differential localization and centroid matching.
//! - [`classify`] – broken/worn labeling strategies.
//! - [`diameter`] – bore and outer-diameter verification.
//! - [`report`] – final report assembly.

pub mod classify;
pub mod defects;
pub mod diameter;
pub mod options;
pub mod report;

use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_circle_mut;
use log::debug;

use crate::align::align;
use crate::contour::{extract_contours, GearContour};
use crate::error::{InspectError, Result};
use crate::mask::{suppress_hub, BinaryMask, ThresholdPolarity};
use crate::types::{AlignmentStatus, CentroidPoint, DefectLabel, InspectionReport};

pub use options::{ClassifyHeuristic, DiameterOptions, InspectorParams, MatchOptions, MatchRule};

/// Reference-derived artifacts, computed once per pipeline run and shared
/// read-only across all sample evaluations.
#[derive(Clone, Debug)]
pub struct ReferenceArtifacts {
    /// Grayscale reference image, kept for keypoint alignment.
    pub image: GrayImage,
    /// Binary silhouette of the reference gear.
    pub mask: BinaryMask,
    /// Pixel-mass centroid of the silhouette.
    pub centroid: CentroidPoint,
    /// Teeth-only silhouette: hub suppressed, then eroded to split teeth.
    pub teeth_mask: BinaryMask,
    /// Individual reference teeth, in extraction order.
    pub teeth: Vec<GearContour>,
    /// Reference bore area in pixels, from the inverted-polarity mask.
    /// Falls back to the configured expected radius when the reference
    /// itself shows no opening.
    pub bore_area_px: f64,
    /// Radius of the minimum enclosing circle of the reference silhouette.
    pub outer_radius_px: f64,
}

impl ReferenceArtifacts {
    pub fn build(image: &GrayImage, params: &InspectorParams) -> Result<Self> {
        let mask = BinaryMask::from_image(image, params.mask_threshold, ThresholdPolarity::Normal)?;
        let centroid = mask.centroid().map_err(|_| {
            InspectError::InvalidImage("reference silhouette is empty".to_string())
        })?;

        let mut teeth_mask = mask.clone();
        suppress_hub(
            &mut teeth_mask,
            centroid,
            params.exclusion_radius,
            params.exclusion_offset,
        );
        let teeth_mask = teeth_mask.erode(params.erosion_iterations);
        let teeth = extract_contours(&teeth_mask, params.min_contour_area);

        let bore_area_px = diameter::bore_area(
            image,
            centroid,
            params.mask_threshold,
            &params.diameter,
        )?
        .unwrap_or_else(|| {
            let r = params.diameter.bore_reference_radius_px;
            std::f64::consts::PI * r * r
        });

        let outer_radius_px = diameter::outer_radius(&mask, params.min_contour_area)
            .ok_or_else(|| {
                InspectError::InvalidImage("reference mask has no outer contour".to_string())
            })?;

        debug!(
            "reference artifacts: centroid=({}, {}), {} teeth, bore area {:.1} px², outer radius {:.1} px",
            centroid.x,
            centroid.y,
            teeth.len(),
            bore_area_px,
            outer_radius_px
        );

        Ok(Self {
            image: image.clone(),
            mask,
            centroid,
            teeth_mask,
            teeth,
            bore_area_px,
            outer_radius_px,
        })
    }
}

/// One sample's evaluation: the report plus the annotated difference mask.
#[derive(Clone, Debug)]
pub struct SampleInspection {
    pub report: InspectionReport,
    /// Eroded differential mask with candidate footprints and defect
    /// markers, written to the output directory by the batch runner.
    pub annotated: GrayImage,
}

/// The main inspection entry point. Holds the parameters and the cached
/// reference snapshot; [`GearInspector::inspect`] is `&self` and safe to
/// call from parallel workers.
pub struct GearInspector {
    params: InspectorParams,
    reference: ReferenceArtifacts,
}

impl GearInspector {
    /// Process the reference image and cache its artifacts.
    pub fn new(reference_image: &GrayImage, params: InspectorParams) -> Result<Self> {
        let reference = ReferenceArtifacts::build(reference_image, &params)?;
        Ok(Self { params, reference })
    }

    pub fn params(&self) -> &InspectorParams {
        &self.params
    }

    pub fn reference(&self) -> &ReferenceArtifacts {
        &self.reference
    }

    /// Run the full pipeline for one sample.
    ///
    /// Failures are terminal for this sample only; the caller decides
    /// whether to continue with other samples.
    pub fn inspect(&self, sample_id: &str, sample: &GrayImage) -> Result<SampleInspection> {
        let (w, h) = sample.dimensions();
        if w == 0 || h == 0 {
            return Err(InspectError::InvalidImage(format!(
                "sample {sample_id} has zero dimensions"
            )));
        }

        let (sample_image, alignment) = match &self.params.align {
            Some(options) => {
                let outcome = align(&self.reference.image, sample, options);
                (outcome.image, outcome.status)
            }
            None => (sample.clone(), AlignmentStatus::Disabled),
        };

        let sample_mask = BinaryMask::from_image(
            &sample_image,
            self.params.mask_threshold,
            ThresholdPolarity::Normal,
        )?;

        let localization = defects::localize_defects(
            &self.reference.mask,
            &sample_mask,
            &self.reference.teeth_mask,
            self.reference.centroid,
            &self.params,
        )?;
        let (labeled, tally) = classify::classify_defects(&localization, &self.params.heuristic);

        let inner = diameter::verify_inner_diameter(
            &sample_image,
            self.reference.centroid,
            self.params.mask_threshold,
            self.reference.bore_area_px,
            &self.params.diameter,
        )?;
        let outer = diameter::verify_outer_diameter(
            &sample_mask,
            self.params.min_contour_area,
            self.reference.outer_radius_px,
            &self.params.diameter,
        );

        let annotated = annotate(&localization.diff_mask, &labeled);
        let report = report::emit(sample_id, labeled, tally, inner, outer, alignment);
        debug!("sample {sample_id}: {}", report.summary);

        Ok(SampleInspection { report, annotated })
    }
}

/// Mark classified defects on the differential mask: a small circle for a
/// worn tooth, a larger one for a broken tooth.
fn annotate(diff_mask: &BinaryMask, defects: &[crate::types::LabeledDefect]) -> GrayImage {
    let mut canvas = diff_mask.as_image().clone();
    for defect in defects {
        let radius = match defect.label {
            DefectLabel::Worn => 10,
            DefectLabel::Broken => 15,
            DefectLabel::Unclassified => continue,
        };
        draw_hollow_circle_mut(
            &mut canvas,
            (defect.centroid.x, defect.centroid.y),
            radius,
            Luma([128u8]),
        );
    }
    canvas
}
