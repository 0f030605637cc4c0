use anyhow::{bail, Context, Error};
use cytof_types::Experiment;
use flate2::read::GzDecoder;
use log::info;
use ndarray::Array2;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const KEY_COLUMNS: [&str; 3] = ["sample_id", "donor", "condition"];

struct SampleRows {
    id: String,
    donor: String,
    condition: String,
    values: Vec<f64>,
}

fn open(path: &Path) -> Result<Box<dyn Read>, Error> {
    let file = File::open(path).with_context(|| path.display().to_string())?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Load a cell table with header `sample_id,donor,condition,<marker...>` and one row per
/// cell. Rows are grouped by `sample_id` in first-seen order; `donor` becomes the stratum
/// and `condition` the class label of the sample.
pub fn load_cell_table(path: impl AsRef<Path>) -> Result<Experiment, Error> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(open(path)?);

    let header = reader.headers().with_context(|| path.display().to_string())?.clone();
    let fields: Vec<&str> = header.iter().map(str::trim).collect();
    if fields.len() <= KEY_COLUMNS.len() || fields[..KEY_COLUMNS.len()] != KEY_COLUMNS {
        bail!(
            "{}: header must be {},<marker...> with at least one marker",
            path.display(),
            KEY_COLUMNS.join(",")
        );
    }
    let markers: Vec<String> = fields[KEY_COLUMNS.len()..].iter().map(|s| s.to_string()).collect();

    let mut samples: Vec<SampleRows> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in reader.records() {
        let record = record.with_context(|| path.display().to_string())?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != fields.len() {
            bail!("line {line}: expected {} fields, found {}", fields.len(), record.len());
        }

        let (id, donor, condition) = (record[0].trim(), record[1].trim(), record[2].trim());
        let slot = *index.entry(id.to_string()).or_insert_with(|| {
            samples.push(SampleRows {
                id: id.to_string(),
                donor: donor.to_string(),
                condition: condition.to_string(),
                values: Vec::new(),
            });
            samples.len() - 1
        });
        let sample = &mut samples[slot];
        if sample.donor != donor {
            bail!(
                "line {line}: sample '{id}' has donor '{donor}' but earlier rows give '{}'",
                sample.donor
            );
        }
        if sample.condition != condition {
            bail!(
                "line {line}: sample '{id}' has condition '{condition}' but earlier rows give '{}'",
                sample.condition
            );
        }

        for (value, marker) in record.iter().skip(KEY_COLUMNS.len()).zip(&markers) {
            let v: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("line {line}: marker {marker} value '{value}'"))?;
            if !v.is_finite() {
                bail!("line {line}: marker {marker} value '{value}' is non-finite");
            }
            sample.values.push(v);
        }
    }
    if samples.is_empty() {
        bail!("{}: no cells", path.display());
    }

    let num_markers = markers.len();
    let mut builder = Experiment::builder(markers);
    for s in samples {
        let cells = Array2::from_shape_vec((s.values.len() / num_markers, num_markers), s.values)?;
        builder.add_sample(s.id, &s.condition, &s.donor, cells);
    }
    let experiment = builder.build()?;
    info!(
        "loaded {} cells in {} samples ({} conditions, {} donors) from {}",
        experiment.num_cells(),
        experiment.samples().len(),
        experiment.classes().len(),
        experiment.strata().len(),
        path.display()
    );
    Ok(experiment)
}
