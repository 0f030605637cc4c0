use cytof_types::{CytofError, Result, Sample};
use kmeans::Partition;
use ndarray::{Array1, Array2};

/// Partition occupancy of one sample. Both vectors are dense with one entry per
/// partition index, including empty ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Occupancy {
    pub sample_id: String,
    pub counts: Array1<u64>,
    pub proportions: Array1<f64>,
}

impl Occupancy {
    /// Number of cells counted.
    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    pub fn num_partitions(&self) -> usize {
        self.counts.len()
    }
}

fn bincount(assigned: &[usize], k: usize) -> Array1<u64> {
    let mut counts = Array1::<u64>::zeros(k);
    for &c in assigned {
        counts[c] += 1;
    }
    counts
}

/// Count the cells of `sample` in every partition index and L1-normalize.
pub fn featurize(partition: &Partition, sample: &Sample) -> Result<Occupancy> {
    if sample.num_cells() == 0 {
        return Err(CytofError::EmptySample {
            sample_id: sample.id.clone(),
        });
    }
    if sample.num_markers() != partition.dim() {
        return Err(CytofError::dimension_mismatch(
            format!("cells of sample '{}'", sample.id),
            partition.dim(),
            sample.num_markers(),
        ));
    }

    let assigned = partition.assign_batch(sample.cells.view())?;
    let counts = bincount(&assigned, partition.num_partitions());
    let total = assigned.len() as f64;
    let proportions = counts.mapv(|c| c as f64 / total);

    Ok(Occupancy {
        sample_id: sample.id.clone(),
        counts,
        proportions,
    })
}

/// Featurize every sample, in input order.
pub fn featurize_all(partition: &Partition, samples: &[Sample]) -> Result<Vec<Occupancy>> {
    samples.iter().map(|s| featurize(partition, s)).collect()
}

fn stack<T: Copy>(occupancies: &[Occupancy], row: impl Fn(&Occupancy) -> &Array1<T>) -> Result<Array2<T>> {
    let k = occupancies.first().map(Occupancy::num_partitions).unwrap_or(0);
    let mut data = Vec::with_capacity(occupancies.len() * k);
    for o in occupancies {
        if o.num_partitions() != k {
            return Err(CytofError::dimension_mismatch(
                format!("occupancy of sample '{}'", o.sample_id),
                k,
                o.num_partitions(),
            ));
        }
        data.extend(row(o).iter().copied());
    }
    Array2::from_shape_vec((occupancies.len(), k), data)
        .map_err(|_| CytofError::dimension_mismatch("occupancy matrix", occupancies.len() * k, 0))
}

/// Sample x partition count matrix, the input of correspondence analysis.
pub fn count_matrix(occupancies: &[Occupancy]) -> Result<Array2<u64>> {
    stack(occupancies, |o| &o.counts)
}

/// Sample x partition proportion matrix.
pub fn proportion_matrix(occupancies: &[Occupancy]) -> Result<Array2<f64>> {
    stack(occupancies, |o| &o.proportions)
}
