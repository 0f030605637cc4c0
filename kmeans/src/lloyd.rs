use crate::partition::{assign_rows, check_finite, Partition};
use cytof_types::{CytofError, Result};
use log::{debug, info};
use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::collections::HashSet;

/// Lloyd's k-means with seeded random initialization.
#[derive(Clone, Debug)]
pub struct KMeans {
    num_partitions: usize,
    max_iterations: usize,
    n_init: usize,
    seed: u64,
}

impl KMeans {
    /// Configure a fit of `num_partitions` centroids with at most `max_iterations` Lloyd
    /// iterations, seeded with `seed`.
    pub fn new(num_partitions: usize, max_iterations: usize, seed: u64) -> KMeans {
        KMeans {
            num_partitions,
            max_iterations,
            n_init: 1,
            seed,
        }
    }

    /// Run `n_init` independent restarts and keep the lowest-inertia fit.
    /// Restart `r` is seeded with `seed + r`; ties keep the lowest restart.
    pub fn with_restarts(mut self, n_init: usize) -> KMeans {
        self.n_init = n_init;
        self
    }

    /// Fit the partition on `points` (one point per row).
    pub fn fit(&self, points: ArrayView2<f64>) -> Result<Partition> {
        if self.num_partitions == 0 {
            return Err(CytofError::invalid_parameter("number of partitions must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(CytofError::invalid_parameter("max iterations must be positive"));
        }
        if self.n_init == 0 {
            return Err(CytofError::invalid_parameter("number of restarts must be positive"));
        }
        if points.ncols() == 0 {
            return Err(CytofError::dimension_mismatch("k-means input", 1, 0));
        }
        check_finite(&points, "point")?;

        info!(
            "fitting {} partitions on {} x {} points ({} restart(s))",
            self.num_partitions,
            points.nrows(),
            points.ncols(),
            self.n_init
        );

        let fits = (0..self.n_init)
            .into_par_iter()
            .map(|r| self.fit_single(&points, self.seed.wrapping_add(r as u64)))
            .collect::<Result<Vec<_>>>()?;

        let mut best: Option<Partition> = None;
        for fit in fits {
            match &best {
                Some(b) if fit.inertia() >= b.inertia() => {}
                _ => best = Some(fit),
            }
        }
        // n_init > 0, so at least one fit exists
        let best = best.ok_or_else(|| CytofError::invalid_parameter("no k-means restart completed"))?;

        info!(
            "k-means finished after {} iterations (converged: {}), inertia {:.4}",
            best.iterations(),
            best.converged(),
            best.inertia()
        );
        Ok(best)
    }

    fn fit_single(&self, points: &ArrayView2<f64>, seed: u64) -> Result<Partition> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut centroids = init_centroids(points, self.num_partitions, &mut rng)?;

        let n = points.nrows();
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let next = assign_rows(&centroids.view(), points);
            iterations += 1;

            let mut changed = 0;
            for (label, (c, _)) in labels.iter_mut().zip(next) {
                if *label != c {
                    *label = c;
                    changed += 1;
                }
            }
            debug!("seed {seed} iteration {iterations}: {changed} reassignments");

            if changed == 0 {
                converged = true;
                break;
            }
            update_centroids(&mut centroids, points, &labels);
        }

        let inertia = assign_rows(&centroids.view(), points).iter().map(|(_, d)| d).sum();
        Ok(Partition::fitted(centroids, iterations, converged, inertia))
    }
}

/// Bit pattern of a row, with -0.0 folded onto 0.0 so equal coordinates compare equal.
fn row_key(row: ndarray::ArrayView1<f64>) -> Vec<u64> {
    row.iter()
        .map(|&v| if v == 0.0 { 0 } else { v.to_bits() })
        .collect()
}

/// Pick `k` pairwise-distinct rows in a seeded random order as the initial centroids.
fn init_centroids(points: &ArrayView2<f64>, k: usize, rng: &mut Pcg64Mcg) -> Result<Array2<f64>> {
    let mut order: Vec<usize> = (0..points.nrows()).collect();
    order.shuffle(rng);

    let mut seen = HashSet::with_capacity(k);
    let mut chosen = Vec::with_capacity(k);
    for i in order {
        if seen.insert(row_key(points.row(i))) {
            chosen.push(i);
            if chosen.len() == k {
                break;
            }
        }
    }

    if chosen.len() < k {
        return Err(CytofError::InsufficientData {
            requested: k,
            distinct: chosen.len(),
        });
    }
    Ok(points.select(Axis(0), &chosen))
}

/// Move each centroid to the mean of its points. A centroid with no points stays put.
fn update_centroids(centroids: &mut Array2<f64>, points: &ArrayView2<f64>, labels: &[usize]) {
    let mut sums = Array2::<f64>::zeros(centroids.dim());
    let mut counts = vec![0usize; centroids.nrows()];

    for (row, &label) in points.axis_iter(Axis(0)).zip(labels) {
        let mut acc = sums.row_mut(label);
        acc += &row;
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = &sums.row(c) / count as f64;
            centroids.row_mut(c).assign(&mean);
        }
    }
}
