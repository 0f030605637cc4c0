//! Command-line plumbing for cytof-rs: cell-table loading and result files.

use anyhow::{anyhow, Context, Error};
use cytof_rs::{Analysis, AnalysisConfig};
use log::info;
use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::Path;

pub mod load;
pub mod output;

pub use load::load_cell_table;

/// Read an `AnalysisConfig` from a JSON file; missing fields take their defaults.
pub fn read_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, Error> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| path.display().to_string())?;
    let config = serde_json::from_reader(BufReader::new(file)).with_context(|| path.display().to_string())?;
    Ok(config)
}

/// Load `input`, fit and featurize, test every condition pair (or every condition against
/// `reference`) and write the result files into `out_dir`.
pub fn run(input: &Path, out_dir: &Path, config: AnalysisConfig, reference: Option<&str>) -> Result<(), Error> {
    let experiment = load_cell_table(input)?;
    let fitted = Analysis::fit(&experiment, config)?;

    let tests = match reference {
        Some(name) => {
            let class = experiment
                .classes()
                .get(name)
                .ok_or_else(|| anyhow!("reference condition '{name}' does not occur in {}", input.display()))?;
            fitted.test_against(class)?
        }
        None => fitted.test_all_pairs()?,
    };
    for t in &tests {
        info!("{} vs {}: p = {:.4}", t.class_a, t.class_b, t.result.p_value);
    }

    create_dir_all(out_dir).with_context(|| out_dir.display().to_string())?;
    output::write_counts(&fitted, out_dir.join("occupancy_counts.csv.gz"))?;
    output::write_centroids(&fitted, out_dir.join("centroids.csv.gz"))?;
    output::write_tests_json(&tests, out_dir.join("fr_tests.json"))?;
    Ok(())
}
