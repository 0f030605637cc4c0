use crate::downsample::downsample_cells;
use crate::featurize::{count_matrix, featurize_all, proportion_matrix, Occupancy};
use cytof_types::{ClassLabel, CytofError, Experiment, Result};
use fr_test::{friedman_rafsky_test_with_cancellation, FrTestResult};
use itertools::Itertools;
use kmeans::{KMeans, Partition};
use log::info;
use ndarray::Array2;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use sample_graph::{build_graph, minimum_spanning_tree, pairwise_distances, DistanceMetric, MstEdge};
use serde::{Deserialize, Serialize};
use snoop::{CancelProgress, NoOpSnoop};

/// Parameters of one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// number of partition cells (k-means centroids)
    pub num_partitions: usize,
    /// cells drawn from each sample to fit the partition
    pub cells_per_sample: usize,
    pub max_iterations: usize,
    /// independent k-means restarts
    pub n_init: usize,
    pub num_permutations: usize,
    pub seed: u64,
    /// metric between sample proportion vectors
    pub metric: DistanceMetric,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            num_partitions: 200,
            cells_per_sample: 500,
            max_iterations: 100,
            n_init: 1,
            num_permutations: 2000,
            seed: 0,
            metric: DistanceMetric::Euclidean,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("num_partitions", self.num_partitions),
            ("cells_per_sample", self.cells_per_sample),
            ("max_iterations", self.max_iterations),
            ("n_init", self.n_init),
            ("num_permutations", self.num_permutations),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(CytofError::invalid_parameter(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Seed of the permutation null for a class pair. Symmetric in the pair.
fn pair_seed(seed: u64, a: ClassLabel, b: ClassLabel) -> u64 {
    let (lo, hi) = if a <= b { (a.0, b.0) } else { (b.0, a.0) };
    let pair = ((lo as u64) << 32) | hi as u64;
    seed ^ pair.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Friedman-Rafsky test of one class pair over the samples carrying either label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairTest {
    pub class_a: String,
    pub class_b: String,
    /// ids of the tested samples; MST node `i` is `sample_ids[i]`
    pub sample_ids: Vec<String>,
    pub mst: Vec<MstEdge>,
    pub result: FrTestResult,
}

pub struct Analysis;

impl Analysis {
    /// Downsample every sample, fit the partition on the pooled cells and featurize every
    /// sample. Class labels are not consulted.
    pub fn fit(experiment: &Experiment, config: AnalysisConfig) -> Result<FittedAnalysis<'_>> {
        config.validate()?;

        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
        let pooled = downsample_cells(experiment.samples(), config.cells_per_sample, &mut rng)?;

        let partition = KMeans::new(config.num_partitions, config.max_iterations, config.seed.wrapping_add(1))
            .with_restarts(config.n_init)
            .fit(pooled.view())?;
        info!(
            "partition fit: {} iterations, converged = {}, inertia {:.3}",
            partition.iterations(),
            partition.converged(),
            partition.inertia()
        );

        let occupancies = featurize_all(&partition, experiment.samples())?;
        info!("featurized {} samples into {} partitions", occupancies.len(), partition.num_partitions());

        Ok(FittedAnalysis {
            experiment,
            config,
            partition,
            occupancies,
        })
    }
}

/// A fitted partition together with the occupancy of every sample of the experiment.
pub struct FittedAnalysis<'a> {
    experiment: &'a Experiment,
    config: AnalysisConfig,
    partition: Partition,
    occupancies: Vec<Occupancy>,
}

impl<'a> FittedAnalysis<'a> {
    pub fn experiment(&self) -> &'a Experiment {
        self.experiment
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// One occupancy per sample, in experiment order.
    pub fn occupancies(&self) -> &[Occupancy] {
        &self.occupancies
    }

    /// Sample x partition counts, the input of correspondence analysis.
    pub fn count_matrix(&self) -> Result<Array2<u64>> {
        count_matrix(&self.occupancies)
    }

    /// Classes carried by at least one sample, in codebook order.
    pub fn present_classes(&self) -> Vec<ClassLabel> {
        let samples = self.experiment.samples();
        self.experiment
            .classes()
            .categories()
            .filter(|c| samples.iter().any(|s| s.label == *c))
            .collect()
    }

    fn class_name(&self, class: ClassLabel) -> Result<String> {
        self.experiment
            .classes()
            .name(class)
            .map(str::to_string)
            .ok_or_else(|| CytofError::InvalidClassSelection(format!("unknown class code {}", class.0)))
    }

    pub fn test_pair(&self, a: ClassLabel, b: ClassLabel) -> Result<PairTest> {
        self.test_pair_with_cancellation(NoOpSnoop, a, b)
    }

    /// Test class `a` against class `b`. Distances, graph and spanning tree are computed
    /// over the samples labelled `a` or `b` only.
    pub fn test_pair_with_cancellation(
        &self,
        snoop: impl CancelProgress,
        a: ClassLabel,
        b: ClassLabel,
    ) -> Result<PairTest> {
        let class_a = self.class_name(a)?;
        let class_b = self.class_name(b)?;
        if a == b {
            return Err(CytofError::InvalidClassSelection(format!(
                "cannot test class '{class_a}' against itself"
            )));
        }

        let selected = self.experiment.sample_indices_with_labels(&[a, b]);
        let samples = self.experiment.samples();
        for (c, name) in [(a, &class_a), (b, &class_b)] {
            if !selected.iter().any(|&i| samples[i].label == c) {
                return Err(CytofError::InvalidClassSelection(format!("class '{name}' has no samples")));
            }
        }

        let occupancies: Vec<Occupancy> = selected.iter().map(|&i| self.occupancies[i].clone()).collect();
        let proportions = proportion_matrix(&occupancies)?;
        let distances = pairwise_distances(&proportions.view(), self.config.metric);
        let graph = build_graph(&distances)?;
        let mst = minimum_spanning_tree(&graph)?;

        let labels: Vec<ClassLabel> = selected.iter().map(|&i| samples[i].label).collect();
        let strata: Vec<_> = selected.iter().map(|&i| samples[i].stratum).collect();
        info!("testing '{}' vs '{}' over {} samples", class_a, class_b, selected.len());
        let result = friedman_rafsky_test_with_cancellation(
            snoop,
            &mst,
            &labels,
            &strata,
            &[a, b],
            self.config.num_permutations,
            pair_seed(self.config.seed, a, b),
        )?;

        Ok(PairTest {
            class_a,
            class_b,
            sample_ids: occupancies.into_iter().map(|o| o.sample_id).collect(),
            mst,
            result,
        })
    }

    /// Test every unordered pair of present classes, in codebook order.
    pub fn test_all_pairs(&self) -> Result<Vec<PairTest>> {
        self.present_classes()
            .into_iter()
            .tuple_combinations()
            .map(|(a, b)| self.test_pair(a, b))
            .collect()
    }

    /// Test every other present class against `reference`.
    pub fn test_against(&self, reference: ClassLabel) -> Result<Vec<PairTest>> {
        let classes = self.present_classes();
        if !classes.contains(&reference) {
            return Err(CytofError::InvalidClassSelection(format!(
                "reference class {} has no samples",
                self.class_name(reference).unwrap_or_else(|_| reference.0.to_string())
            )));
        }
        classes
            .into_iter()
            .filter(|&c| c != reference)
            .map(|c| self.test_pair(reference, c))
            .collect()
    }
}
