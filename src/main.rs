use gear_inspector::config;
use gear_inspector::image_io::{
    list_sample_images, load_grayscale_image, save_grayscale_image, write_json_file,
};
use gear_inspector::{GearInspector, Result};
use log::warn;
use rayon::prelude::*;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "gear-inspector".to_string());
    let config = config::parse_cli(&program)?;

    let reference = load_grayscale_image(&config.reference_path)?;
    let inspector = GearInspector::new(&reference, config.params.clone())?;

    let samples = list_sample_images(&config.samples_dir)?;
    if samples.is_empty() {
        warn!("no sample images found in {}", config.samples_dir.display());
    }

    // The reference artifacts are immutable, so samples are independent and
    // processed one worker per sample.
    let results: Vec<(String, Result<gear_inspector::SampleInspection>)> = samples
        .par_iter()
        .map(|path| {
            let sample_id = sample_id_of(path);
            let inspection = load_grayscale_image(path)
                .and_then(|sample| inspector.inspect(&sample_id, &sample));
            (sample_id, inspection)
        })
        .collect();

    for (sample_id, outcome) in &results {
        match outcome {
            Ok(inspection) => {
                let report = &inspection.report;
                println!("Sample {sample_id}: {}", report.summary);
                println!("Results for {sample_id}:");
                println!("  Inner Diameter Status: {}", report.inner_diameter.status);
                println!("  Outer Diameter Status: {}", report.outer_diameter.status);
                println!("  Broken Teeth Count: {}", report.broken_count);
                println!("  Worn Teeth Count: {}", report.worn_count);
            }
            // A bad sample never aborts the rest of the batch.
            Err(err) => eprintln!("Sample {sample_id}: skipped ({err})"),
        }
    }

    if let Some(dir) = &config.output.annotated_dir {
        for ((_, outcome), path) in results.iter().zip(&samples) {
            if let Ok(inspection) = outcome {
                let out_path = dir.join(file_name_of(path));
                save_grayscale_image(&inspection.annotated, &out_path)?;
            }
        }
        println!("Annotated masks written to {}", dir.display());
    }

    if let Some(dir) = &config.output.report_dir {
        for (sample_id, outcome) in &results {
            if let Ok(inspection) = outcome {
                write_json_file(&dir.join(format!("{sample_id}.json")), &inspection.report)?;
            }
        }
        println!("JSON reports written to {}", dir.display());
    }

    Ok(())
}

fn sample_id_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sample")
        .to_string()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("sample.png")
        .to_string()
}
