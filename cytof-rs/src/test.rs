use crate::{Analysis, AnalysisConfig};
use approx::assert_abs_diff_eq;
use cytof_types::{ClassLabel, CytofError, Experiment};
use ndarray::{array, Array2};
use rand::distributions::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg64Mcg;

/// Cell-type centers in a 3-marker receptor space.
fn centers() -> Array2<f64> {
    array![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]
}

/// `n` cells drawn from the cell types with mixture weights `weights`.
fn cells(rng: &mut impl Rng, n: usize, weights: &[f64]) -> Array2<f64> {
    let centers = centers();
    let types = WeightedIndex::new(weights).unwrap();
    let noise = Normal::new(0.0, 0.5).unwrap();
    let mut out = Array2::zeros((n, centers.ncols()));
    for mut row in out.rows_mut() {
        let t = rng.sample(&types);
        for d in 0..centers.ncols() {
            row[d] = centers[[t, d]] + rng.sample(noise);
        }
    }
    out
}

/// `donors` donors, each with one sample per condition.
fn experiment(donors: usize, conditions: &[(&str, [f64; 4])], cells_per_sample: usize, seed: u64) -> Experiment {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let markers = vec!["CD3".to_string(), "CD19".to_string(), "CD14".to_string()];
    let mut b = Experiment::builder(markers);
    for d in 0..donors {
        for (cond, weights) in conditions {
            let donor = format!("donor{d}");
            b.add_sample(
                format!("{donor}_{cond}"),
                cond,
                &donor,
                cells(&mut rng, cells_per_sample, weights),
            );
        }
    }
    b.build().unwrap()
}

fn small_config() -> AnalysisConfig {
    AnalysisConfig {
        num_partitions: 8,
        cells_per_sample: 100,
        n_init: 3,
        num_permutations: 199,
        seed: 5,
        ..AnalysisConfig::default()
    }
}

const UNSTIM: [f64; 4] = [0.4, 0.3, 0.2, 0.1];
const STIM: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

#[test]
fn test_shifted_condition_is_detected() {
    let exp = experiment(8, &[("Unstim", UNSTIM), ("IFNg", STIM)], 300, 0);
    let fitted = Analysis::fit(&exp, small_config()).unwrap();

    let unstim = exp.classes().get("Unstim").unwrap();
    let ifng = exp.classes().get("IFNg").unwrap();
    let test = fitted.test_pair(unstim, ifng).unwrap();

    assert_eq!(test.class_a, "Unstim");
    assert_eq!(test.class_b, "IFNg");
    assert_eq!(test.sample_ids.len(), 16);
    assert_eq!(test.mst.len(), 15);
    assert_eq!(test.result.num_strata, 8);
    assert_eq!(test.result.informative_strata, 8);
    assert_eq!(test.result.null_distribution.len(), 199);
    assert!(test.result.p_value < 0.05, "p = {}", test.result.p_value);

    // the pair seed is symmetric, so the null does not depend on argument order
    let swapped = fitted.test_pair(ifng, unstim).unwrap();
    assert_eq!(swapped.result.null_distribution, test.result.null_distribution);
    assert_eq!(swapped.result.p_value, test.result.p_value);
}

#[test]
fn test_featurization_ignores_labels() {
    let exp = experiment(3, &[("A", UNSTIM), ("B", STIM)], 120, 1);

    // same cells and ids, every label flipped
    let mut b = Experiment::builder(exp.markers().to_vec());
    for s in exp.samples() {
        let flipped = if exp.classes().name(s.label) == Some("A") { "B" } else { "A" };
        let donor = exp.strata().name(s.stratum).unwrap();
        b.add_sample(s.id.clone(), flipped, donor, s.cells.clone());
    }
    let relabelled = b.build().unwrap();

    let cfg = small_config();
    let x = Analysis::fit(&exp, cfg.clone()).unwrap();
    let y = Analysis::fit(&relabelled, cfg).unwrap();
    assert_eq!(x.partition().centroids(), y.partition().centroids());
    assert_eq!(x.occupancies(), y.occupancies());
}

#[test]
fn test_occupancies_are_consistent() {
    let exp = experiment(4, &[("A", UNSTIM), ("B", STIM)], 150, 2);
    let fitted = Analysis::fit(&exp, small_config()).unwrap();

    let counts = fitted.count_matrix().unwrap();
    assert_eq!(counts.dim(), (8, 8));
    for (occ, sample) in fitted.occupancies().iter().zip(exp.samples()) {
        assert_eq!(occ.sample_id, sample.id);
        assert_eq!(occ.total(), sample.num_cells() as u64);
        assert_abs_diff_eq!(occ.proportions.sum(), 1.0, epsilon = 1e-9);
    }
    assert_eq!(counts.sum(), exp.num_cells() as u64);

    // a second fit with the same configuration reproduces everything
    let again = Analysis::fit(&exp, small_config()).unwrap();
    assert_eq!(again.occupancies(), fitted.occupancies());
}

#[test]
fn test_pair_enumeration() {
    let exp = experiment(
        3,
        &[("Unstim", UNSTIM), ("IFNg", STIM), ("IL2", [0.25, 0.25, 0.25, 0.25])],
        80,
        3,
    );
    let cfg = AnalysisConfig {
        num_permutations: 19,
        ..small_config()
    };
    let fitted = Analysis::fit(&exp, cfg).unwrap();

    let all = fitted.test_all_pairs().unwrap();
    let names: Vec<_> = all.iter().map(|t| (t.class_a.as_str(), t.class_b.as_str())).collect();
    assert_eq!(names, vec![("Unstim", "IFNg"), ("Unstim", "IL2"), ("IFNg", "IL2")]);
    assert!(all.iter().all(|t| t.sample_ids.len() == 6 && t.mst.len() == 5));

    let reference = exp.classes().get("IL2").unwrap();
    let against = fitted.test_against(reference).unwrap();
    assert_eq!(against.len(), 2);
    assert!(against.iter().all(|t| t.class_a == "IL2"));
}

#[test]
fn test_invalid_requests() {
    let exp = experiment(2, &[("A", UNSTIM), ("B", STIM)], 60, 4);
    let cfg = AnalysisConfig {
        num_permutations: 9,
        ..small_config()
    };
    let fitted = Analysis::fit(&exp, cfg).unwrap();
    let a = exp.classes().get("A").unwrap();

    assert!(matches!(fitted.test_pair(a, a), Err(CytofError::InvalidClassSelection(_))));
    assert!(matches!(
        fitted.test_pair(a, ClassLabel(9)),
        Err(CytofError::InvalidClassSelection(_))
    ));
    assert!(matches!(
        fitted.test_against(ClassLabel(9)),
        Err(CytofError::InvalidClassSelection(_))
    ));

    let bad = AnalysisConfig {
        num_partitions: 0,
        ..small_config()
    };
    assert!(matches!(Analysis::fit(&exp, bad), Err(CytofError::InvalidParameter(_))));
}

#[test]
fn test_empty_sample_is_rejected() {
    let mut b = Experiment::builder(vec!["CD3".to_string()]);
    b.add_sample("full", "A", "d1", Array2::ones((10, 1)))
        .add_sample("empty", "B", "d1", Array2::zeros((0, 1)));
    let exp = b.build().unwrap();
    assert_eq!(
        Analysis::fit(&exp, small_config()).err(),
        Some(CytofError::EmptySample {
            sample_id: "empty".to_string()
        })
    );
}
