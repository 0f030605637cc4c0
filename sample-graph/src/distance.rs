use ndarray::{Array2, ArrayView1, ArrayView2};
use num_traits::Float;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn apply<T: Float>(self, x1: &ArrayView1<T>, x2: &ArrayView1<T>) -> T {
        let mut dx = x2 - x1;
        match self {
            DistanceMetric::Euclidean => {
                dx.map_inplace(|v| {
                    *v = (*v) * (*v);
                });
                dx.sum().sqrt()
            }
            DistanceMetric::Manhattan => {
                dx.map_inplace(|v| {
                    *v = v.abs();
                });
                dx.sum()
            }
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "manhattan" | "cityblock" => Ok(DistanceMetric::Manhattan),
            _ => Err(format!("unknown distance metric '{s}'")),
        }
    }
}

/// Distances between every pair of rows of `vectors`. The result is symmetric with a zero
/// diagonal; each pair is computed once and mirrored.
pub fn pairwise_distances<T: Float>(vectors: &ArrayView2<T>, metric: DistanceMetric) -> Array2<T> {
    let n = vectors.nrows();
    let mut d = Array2::<T>::zeros((n, n));
    for i in 0..n {
        let x_i = vectors.row(i);
        for j in i + 1..n {
            let x_j = vectors.row(j);
            let dist = metric.apply(&x_i, &x_j);
            d[[i, j]] = dist;
            d[[j, i]] = dist;
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn test_metrics() {
        let a = array![0.0, 0.0, 1.0];
        let b = array![3.0, 4.0, 1.0];
        assert_eq!(DistanceMetric::Euclidean.apply(&a.view(), &b.view()), 5.0);
        assert_eq!(DistanceMetric::Manhattan.apply(&a.view(), &b.view()), 7.0);
        assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
        assert_eq!("Manhattan".parse::<DistanceMetric>(), Ok(DistanceMetric::Manhattan));
        assert!("cosine".parse::<DistanceMetric>().is_err());
    }

    #[test]
    fn test_pairwise_symmetric_zero_diagonal() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let v = Array2::random_using((12, 7), Uniform::new(0.0, 1.0), &mut rng);

        for metric in [DistanceMetric::Euclidean, DistanceMetric::Manhattan] {
            let d = pairwise_distances(&v.view(), metric);
            assert_eq!(d.dim(), (12, 12));
            for i in 0..12 {
                assert_eq!(d[[i, i]], 0.0);
                for j in 0..12 {
                    assert_eq!(d[[i, j]], d[[j, i]]);
                    assert!(d[[i, j]] >= 0.0);
                }
            }
            assert_eq!(d[[2, 5]], metric.apply(&v.row(2), &v.row(5)));
        }
    }

    #[test]
    fn test_pairwise_small() {
        let v = array![[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]];
        let d = pairwise_distances(&v.view(), DistanceMetric::Euclidean);
        assert_eq!(d, array![[0.0, 5.0, 10.0], [5.0, 0.0, 5.0], [10.0, 5.0, 0.0]]);

        let empty = Array2::<f64>::zeros((0, 3));
        assert_eq!(pairwise_distances(&empty.view(), DistanceMetric::Euclidean).dim(), (0, 0));
    }
}
