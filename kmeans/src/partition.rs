use cytof_types::{CytofError, Result};
use ndarray::parallel::prelude::{IntoParallelIterator, ParallelIterator};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// A fixed set of K centroids partitioning receptor space. Partition index `i` is the
/// Voronoi cell of row `i` of the centroid matrix.
#[derive(Clone, Debug)]
pub struct Partition {
    centroids: Array2<f64>,
    iterations: usize,
    converged: bool,
    inertia: f64,
}

impl Partition {
    /// Wrap a precomputed centroid matrix (one centroid per row).
    pub fn from_centroids(centroids: Array2<f64>) -> Result<Partition> {
        if centroids.nrows() == 0 {
            return Err(CytofError::invalid_parameter("a partition needs at least one centroid"));
        }
        if centroids.ncols() == 0 {
            return Err(CytofError::dimension_mismatch("partition centroids", 1, 0));
        }
        check_finite(&centroids.view(), "centroid")?;
        Ok(Partition {
            centroids,
            iterations: 0,
            converged: true,
            inertia: 0.0,
        })
    }

    pub(crate) fn fitted(centroids: Array2<f64>, iterations: usize, converged: bool, inertia: f64) -> Partition {
        Partition {
            centroids,
            iterations,
            converged,
            inertia,
        }
    }

    /// Number of partition cells, K.
    pub fn num_partitions(&self) -> usize {
        self.centroids.nrows()
    }

    /// Dimension of receptor space.
    pub fn dim(&self) -> usize {
        self.centroids.ncols()
    }

    /// Centroid matrix, one centroid per row.
    pub fn centroids(&self) -> ArrayView2<'_, f64> {
        self.centroids.view()
    }

    /// Lloyd iterations used by the fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// True if the fit stopped because assignments stopped changing.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Sum of squared distances of the fit points to their centroids.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Partition index of a single cell.
    pub fn assign(&self, cell: ArrayView1<f64>) -> Result<usize> {
        if cell.len() != self.dim() {
            return Err(CytofError::dimension_mismatch("cell", self.dim(), cell.len()));
        }
        if cell.iter().any(|v| !v.is_finite()) {
            return Err(CytofError::invalid_parameter("cell has a non-finite value"));
        }
        Ok(nearest(&self.centroids.view(), &cell).0)
    }

    /// Partition index of every row of `cells`, in row order.
    pub fn assign_batch(&self, cells: ArrayView2<f64>) -> Result<Vec<usize>> {
        if cells.ncols() != self.dim() {
            return Err(CytofError::dimension_mismatch("cells", self.dim(), cells.ncols()));
        }
        check_finite(&cells, "cell")?;
        Ok(assign_rows(&self.centroids.view(), &cells).into_iter().map(|(c, _)| c).collect())
    }
}

/// Every value of `points` must be finite; a NaN row has no nearest centroid.
pub(crate) fn check_finite(points: &ArrayView2<f64>, what: &str) -> Result<()> {
    match points.rows().into_iter().position(|r| r.iter().any(|v| !v.is_finite())) {
        Some(row) => Err(CytofError::invalid_parameter(format!("{what} {row} has a non-finite value"))),
        None => Ok(()),
    }
}

pub(crate) fn squared_distance(x: &ArrayView1<f64>, y: &ArrayView1<f64>) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Closest centroid to `x` and the squared distance to it. Centroids are scanned in index
/// order and only a strictly smaller distance replaces the current best, so ties go to
/// the lowest index.
pub(crate) fn nearest(centroids: &ArrayView2<f64>, x: &ArrayView1<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = squared_distance(&centroid, x);
        if d < best_d {
            best = c;
            best_d = d;
        }
    }
    (best, best_d)
}

/// Nearest centroid for every row. Order preserving, so the result does not depend on
/// the number of worker threads.
pub(crate) fn assign_rows(centroids: &ArrayView2<f64>, points: &ArrayView2<f64>) -> Vec<(usize, f64)> {
    points
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| nearest(centroids, &row))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_non_finite_values_are_rejected() {
        let p = Partition::from_centroids(array![[0.0, 0.0], [10.0, 0.0]]).unwrap();
        assert!(matches!(
            p.assign(array![f64::NAN, 10.0].view()),
            Err(CytofError::InvalidParameter(_))
        ));
        let err = p
            .assign_batch(array![[0.0, 1.0], [f64::INFINITY, 0.0]].view())
            .unwrap_err();
        assert_eq!(err, CytofError::invalid_parameter("cell 1 has a non-finite value"));
        assert!(Partition::from_centroids(array![[0.0, f64::NAN]]).is_err());
    }

    #[test]
    fn test_assign_ties_go_to_lowest_index() {
        let p = Partition::from_centroids(array![[1.0, 0.0], [-1.0, 0.0], [0.0, 5.0]]).unwrap();
        assert_eq!(p.assign(array![0.0, 0.0].view()).unwrap(), 0);
        assert_eq!(p.assign(array![-0.9, 0.1].view()).unwrap(), 1);
        assert_eq!(p.assign(array![0.0, 4.0].view()).unwrap(), 2);

        let batch = p.assign_batch(array![[0.0, 0.0], [-3.0, 0.0], [0.2, 9.0]].view()).unwrap();
        assert_eq!(batch, vec![0, 1, 2]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let p = Partition::from_centroids(array![[1.0, 0.0], [-1.0, 0.0]]).unwrap();
        assert_eq!(
            p.assign(array![0.0, 0.0, 0.0].view()),
            Err(CytofError::dimension_mismatch("cell", 2, 3))
        );
        assert!(p.assign_batch(array![[0.0], [1.0]].view()).is_err());
        assert!(Partition::from_centroids(Array2::zeros((0, 2))).is_err());
        assert!(Partition::from_centroids(Array2::zeros((2, 0))).is_err());
    }
}
