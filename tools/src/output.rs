use anyhow::{Context, Error};
use cytof_rs::{FittedAnalysis, PairTest};
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::ArrayView2;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `array` as gzip'd CSV under `header`. With `row_names`, each row is prefixed by
/// its name and the header should name that column too.
pub fn array_to_csv<T: Display>(
    header: &[String],
    row_names: Option<&[String]>,
    array: ArrayView2<T>,
    path: impl AsRef<Path>,
) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| path.display().to_string())?;
    let mut writer = csv::Writer::from_writer(GzEncoder::new(BufWriter::new(file), Compression::default()));
    writer.write_record(header)?;
    for (i, row) in array.rows().into_iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
        if let Some(names) = row_names {
            record.push(names[i].clone());
        }
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    let mut inner = writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .finish()
        .with_context(|| path.display().to_string())?;
    inner.flush()?;
    Ok(())
}

/// `occupancy_counts.csv.gz`: one row per sample, one column per partition index.
pub fn write_counts(fitted: &FittedAnalysis, path: impl AsRef<Path>) -> Result<(), Error> {
    let counts = fitted.count_matrix()?;
    let mut header = vec!["sample_id".to_string()];
    header.extend((0..counts.ncols()).map(|k| k.to_string()));
    let ids: Vec<String> = fitted.occupancies().iter().map(|o| o.sample_id.clone()).collect();
    array_to_csv(&header, Some(&ids), counts.view(), path)
}

/// `centroids.csv.gz`: one row per partition index, one column per marker.
pub fn write_centroids(fitted: &FittedAnalysis, path: impl AsRef<Path>) -> Result<(), Error> {
    array_to_csv(fitted.experiment().markers(), None, fitted.partition().centroids(), path)
}

pub fn write_tests_json(tests: &[PairTest], path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| path.display().to_string())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, tests)?;
    writer.flush()?;
    Ok(())
}
