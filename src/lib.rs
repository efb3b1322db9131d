#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod error;
pub mod image_io;
pub mod inspector;
pub mod types;

// Lower-level building blocks – still public, but considered internals.
pub mod align;
pub mod contour;
pub mod geometry;
pub mod mask;

// --- High-level re-exports -------------------------------------------------

// Main entry points: inspector + results.
pub use crate::error::{InspectError, Result};
pub use crate::inspector::{GearInspector, InspectorParams, ReferenceArtifacts, SampleInspection};
pub use crate::types::{DefectLabel, DiameterStatus, InspectionReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use gear_inspector::prelude::*;
/// use gear_inspector::image_io::load_grayscale_image;
///
/// # fn main() -> gear_inspector::Result<()> {
/// let reference = load_grayscale_image(std::path::Path::new("samples/ideal.jpg"))?;
/// let sample = load_grayscale_image(std::path::Path::new("samples/sample2.jpg"))?;
///
/// let inspector = GearInspector::new(&reference, InspectorParams::default())?;
/// let inspection = inspector.inspect("sample2", &sample)?;
/// println!("Sample sample2: {}", inspection.report.summary);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::inspector::{GearInspector, InspectorParams};
    pub use crate::types::{DefectLabel, DiameterStatus, InspectionReport};
}
