use cytof_types::{group_indices, ClassLabel, Stratum};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Independent random stream for permutation `index`. Every permutation gets its own
/// ChaCha stream under the same key, so the draws do not depend on execution order.
pub fn permutation_stream(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// Shuffles class labels within strata, never across them.
#[derive(Clone, Debug)]
pub struct StratifiedPermuter {
    // node positions of each stratum that holds more than one distinct label
    groups: Vec<Vec<usize>>,
    num_strata: usize,
}

impl StratifiedPermuter {
    pub fn new(labels: &[ClassLabel], strata: &[Stratum]) -> StratifiedPermuter {
        let all = group_indices(strata);
        let num_strata = all.len();
        let groups = all
            .into_values()
            .filter(|g| g.iter().any(|&i| labels[i] != labels[g[0]]))
            .collect();
        StratifiedPermuter { groups, num_strata }
    }

    /// Number of distinct strata.
    pub fn num_strata(&self) -> usize {
        self.num_strata
    }

    /// Strata containing at least two distinct labels. Permuting any other stratum
    /// leaves the labeling unchanged, so those are skipped.
    pub fn informative_strata(&self) -> usize {
        self.groups.len()
    }

    /// A copy of `labels` shuffled independently inside each stratum. Strata are visited
    /// in ascending stratum code.
    pub fn permute(&self, labels: &[ClassLabel], rng: &mut impl Rng) -> Vec<ClassLabel> {
        let mut out = labels.to_vec();
        let mut buf = Vec::new();
        for group in &self.groups {
            buf.clear();
            buf.extend(group.iter().map(|&i| labels[i]));
            buf.shuffle(rng);
            for (&i, &l) in group.iter().zip(buf.iter()) {
                out[i] = l;
            }
        }
        out
    }
}
