use cytof_types::{CytofError, Result, Sample};
use log::{debug, info};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use rand::seq::index;
use rand::Rng;

/// Pool up to `per_sample` cells from every sample, drawn uniformly without replacement,
/// so that no sample dominates the partition fit. Samples are visited in input order with
/// the single stream `rng`; the rows drawn from a sample keep their original order.
pub fn downsample_cells(samples: &[Sample], per_sample: usize, rng: &mut impl Rng) -> Result<Array2<f64>> {
    if per_sample == 0 {
        return Err(CytofError::invalid_parameter("cells per sample must be positive"));
    }
    let first = samples
        .first()
        .ok_or_else(|| CytofError::invalid_parameter("no samples to draw cells from"))?;
    let dim = first.num_markers();

    let mut drawn: Vec<Array2<f64>> = Vec::with_capacity(samples.len());
    for s in samples {
        if s.num_markers() != dim {
            return Err(CytofError::dimension_mismatch(
                format!("markers of sample '{}'", s.id),
                dim,
                s.num_markers(),
            ));
        }
        let n = s.num_cells();
        if n == 0 {
            return Err(CytofError::EmptySample {
                sample_id: s.id.clone(),
            });
        }

        let take = per_sample.min(n);
        let mut rows = index::sample(rng, n, take).into_vec();
        rows.sort_unstable();
        debug!("drawing {} of {} cells from sample {}", take, n, s.id);
        drawn.push(s.cells.select(Axis(0), &rows));
    }

    let views: Vec<ArrayView2<f64>> = drawn.iter().map(|a| a.view()).collect();
    let pooled = concatenate(Axis(0), &views)
        .map_err(|_| CytofError::dimension_mismatch("pooled cells", dim, 0))?;
    info!("pooled {} cells from {} samples for partition fitting", pooled.nrows(), samples.len());
    Ok(pooled)
}
