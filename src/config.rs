//! Runtime configuration: JSON config files and CLI parsing for the batch
//! runner.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::align::AlignOptions;
use crate::error::{InspectError, Result};
use crate::inspector::InspectorParams;

/// Where the batch runner writes its artifacts.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for annotated difference masks, one per sample under the
    /// sample's original filename.
    pub annotated_dir: Option<PathBuf>,
    /// Directory for per-sample JSON reports.
    pub report_dir: Option<PathBuf>,
}

/// Full runtime configuration of one batch run.
#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub reference_path: PathBuf,
    pub samples_dir: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: InspectorParams,
}

/// Load a [`RuntimeConfig`] from a JSON file.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| InspectError::Config(format!("failed to read {}: {e}", path.display())))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| InspectError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(config)
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <reference-image> <samples-dir> [options]\n\
         \n\
         Options:\n\
         \x20 --config <path>   JSON runtime configuration (overrides positionals)\n\
         \x20 --out <dir>       directory for annotated difference masks\n\
         \x20 --json <dir>      directory for per-sample JSON reports\n\
         \x20 --align           align each sample to the reference before comparison"
    )
}

/// Parse the command line into a [`RuntimeConfig`].
///
/// A `--config` file provides the base configuration; positional arguments
/// and flags override its fields.
pub fn parse_cli(program: &str) -> Result<RuntimeConfig> {
    parse_args(program, env::args().skip(1).collect())
}

fn parse_args(program: &str, args: Vec<String>) -> Result<RuntimeConfig> {
    let mut positionals = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut annotated_dir: Option<PathBuf> = None;
    let mut report_dir: Option<PathBuf> = None;
    let mut align = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(expect_value(&mut iter, "--config")?),
            "--out" => annotated_dir = Some(expect_value(&mut iter, "--out")?),
            "--json" => report_dir = Some(expect_value(&mut iter, "--json")?),
            "--align" => align = true,
            "--help" | "-h" => return Err(InspectError::Config(usage(program))),
            other if other.starts_with("--") => {
                return Err(InspectError::Config(format!(
                    "unknown option {other}\n\n{}",
                    usage(program)
                )));
            }
            _ => positionals.push(PathBuf::from(arg)),
        }
    }

    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => {
            if positionals.len() < 2 {
                return Err(InspectError::Config(format!(
                    "missing reference image and samples directory\n\n{}",
                    usage(program)
                )));
            }
            RuntimeConfig {
                reference_path: positionals[0].clone(),
                samples_dir: positionals[1].clone(),
                output: OutputConfig::default(),
                params: InspectorParams::default(),
            }
        }
    };

    if let Some(path) = positionals.first() {
        config.reference_path = path.clone();
    }
    if let Some(path) = positionals.get(1) {
        config.samples_dir = path.clone();
    }
    if annotated_dir.is_some() {
        config.output.annotated_dir = annotated_dir;
    }
    if report_dir.is_some() {
        config.output.report_dir = report_dir;
    }
    if align && config.params.align.is_none() {
        config.params.align = Some(AlignOptions::default());
    }

    Ok(config)
}

fn expect_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| InspectError::Config(format!("{flag} expects a value")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positionals_and_flags_parse() {
        let config = parse_args(
            "gear-inspector",
            args(&["ideal.jpg", "samples", "--out", "annotated", "--align"]),
        )
        .unwrap();
        assert_eq!(config.reference_path, PathBuf::from("ideal.jpg"));
        assert_eq!(config.samples_dir, PathBuf::from("samples"));
        assert_eq!(config.output.annotated_dir, Some(PathBuf::from("annotated")));
        assert!(config.params.align.is_some());
    }

    #[test]
    fn missing_positionals_fail_with_usage() {
        let err = parse_args("gear-inspector", args(&["only-one"])).unwrap_err();
        assert!(matches!(err, InspectError::Config(_)));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse_args("gear-inspector", args(&["a", "b", "--frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("--frobnicate"));
    }

    #[test]
    fn partial_json_config_uses_defaults() {
        let json = r#"{
            "reference_path": "ideal.jpg",
            "samples_dir": "samples",
            "params": { "mask_threshold": 40 }
        }"#;
        let config: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.params.mask_threshold, 40);
        assert_eq!(config.params.exclusion_radius, 165);
        assert_eq!(config.params.matching.max_centroid_distance, 20.0);
    }
}
