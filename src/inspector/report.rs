//! Report assembly. Pure aggregation of the stage outputs; never fails.

use crate::types::{
    AlignmentStatus, DefectTally, DiameterMeasurement, DiameterStatus, InspectionReport,
    LabeledDefect,
};

const SEPARATOR: &str = " + ";

/// Assemble the immutable per-sample report.
pub fn emit(
    sample_id: &str,
    defects: Vec<LabeledDefect>,
    tally: DefectTally,
    inner_diameter: DiameterMeasurement,
    outer_diameter: DiameterMeasurement,
    alignment: AlignmentStatus,
) -> InspectionReport {
    let summary = summarize(&tally, &inner_diameter, &outer_diameter);
    InspectionReport {
        sample_id: sample_id.to_string(),
        defects,
        broken_count: tally.broken,
        worn_count: tally.worn,
        inner_diameter,
        outer_diameter,
        alignment,
        summary,
    }
}

/// Join the non-zero defect counts and out-of-band diameter findings.
/// An in-tolerance part with no defects reads "No defects detected".
fn summarize(
    tally: &DefectTally,
    inner: &DiameterMeasurement,
    outer: &DiameterMeasurement,
) -> String {
    let mut parts = Vec::new();
    if tally.broken > 0 {
        parts.push(format!("Broken teeth: {}", tally.broken));
    }
    if tally.worn > 0 {
        parts.push(format!("Worn teeth: {}", tally.worn));
    }
    match inner.status {
        DiameterStatus::Identical => {}
        DiameterStatus::NoOpeningDetected | DiameterStatus::NoContoursFound => {
            parts.push("No inner opening detected".to_string());
        }
        status => parts.push(format!(
            "{:.2} mm - {status} inner opening",
            inner.diameter_mm
        )),
    }
    match outer.status {
        DiameterStatus::Identical => {}
        DiameterStatus::NoOpeningDetected | DiameterStatus::NoContoursFound => {
            parts.push("No outer contour detected".to_string());
        }
        status => parts.push(format!(
            "{:.2} mm - {status} outer diameter",
            outer.diameter_mm
        )),
    }

    if parts.is_empty() {
        "No defects detected".to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within_band() -> DiameterMeasurement {
        DiameterMeasurement {
            diameter_px: 50.0,
            diameter_mm: 30.0,
            status: DiameterStatus::Identical,
        }
    }

    #[test]
    fn clean_sample_reads_no_defects() {
        let report = emit(
            "sample2",
            Vec::new(),
            DefectTally::default(),
            within_band(),
            within_band(),
            AlignmentStatus::Disabled,
        );
        assert_eq!(report.summary, "No defects detected");
        assert_eq!(report.broken_count, 0);
        assert_eq!(report.worn_count, 0);
    }

    #[test]
    fn counts_and_diameter_join_with_fixed_separator() {
        let inner = DiameterMeasurement {
            diameter_px: 55.0,
            diameter_mm: 33.0,
            status: DiameterStatus::Larger,
        };
        let report = emit(
            "sample3",
            Vec::new(),
            DefectTally { broken: 2, worn: 1 },
            inner,
            within_band(),
            AlignmentStatus::Disabled,
        );
        assert_eq!(
            report.summary,
            "Broken teeth: 2 + Worn teeth: 1 + 33.00 mm - Larger inner opening"
        );
    }

    #[test]
    fn missing_bore_is_reported_as_status_not_error() {
        let report = emit(
            "sample4",
            Vec::new(),
            DefectTally::default(),
            DiameterMeasurement::absent(DiameterStatus::NoOpeningDetected),
            within_band(),
            AlignmentStatus::Disabled,
        );
        assert_eq!(report.summary, "No inner opening detected");
    }

    #[test]
    fn report_serializes_to_json() {
        let report = emit(
            "sample5",
            Vec::new(),
            DefectTally { broken: 1, worn: 0 },
            within_band(),
            within_band(),
            AlignmentStatus::Underdetermined { correspondences: 2 },
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"sample_id\":\"sample5\""));
        assert!(json.contains("\"broken_count\":1"));
    }
}
