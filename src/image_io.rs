//! I/O helpers for grayscale images and JSON reports.
//!
//! - `load_grayscale_image`: read a PNG/JPEG/etc. into an 8-bit gray buffer.
//! - `save_grayscale_image`: write an 8-bit gray buffer to disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `list_sample_images`: enumerate the `.jpg`/`.png` files of a directory.

use image::GrayImage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InspectError, Result};

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)
        .map_err(|source| InspectError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_luma8();
    if img.width() == 0 || img.height() == 0 {
        return Err(InspectError::InvalidImage(format!(
            "{} has zero dimensions",
            path.display()
        )));
    }
    Ok(img)
}

/// Save an 8-bit grayscale buffer, creating parent directories.
pub fn save_grayscale_image(image: &GrayImage, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    image.save(path).map_err(|source| InspectError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| InspectError::Config(format!("failed to serialize JSON: {e}")))?;
    fs::write(path, json)?;
    Ok(())
}

/// Enumerate the sample images of `dir` (`.jpg`, `.jpeg`, `.png`), sorted by
/// file name for a deterministic processing order.
pub fn list_sample_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
            .unwrap_or(false);
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
