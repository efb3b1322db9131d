use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the inspection pipeline.
///
/// Only genuinely fatal conditions for a single image become errors. Expected
/// geometric outcomes (no opening detected, alignment underdetermined, no
/// contours found) are status values on the result types instead.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("degenerate contour: zero-area moment denominator")]
    DegenerateContour,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InspectError>;
