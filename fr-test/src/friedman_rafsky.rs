//! Friedman-Rafsky two-sample test on a fixed minimum spanning tree
//!
use crate::permute::{permutation_stream, StratifiedPermuter};
use cytof_types::{ClassLabel, CytofError, Result, Stratum};
use log::{info, warn};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use sample_graph::MstEdge;
use snoop::{CancelProgress, NoOpSnoop};

/// Outcome of a Friedman-Rafsky test
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrTestResult {
    /// nodes in the tested subset
    pub num_nodes: usize,
    /// spanning tree edges
    pub num_edges: usize,
    /// edges joining two nodes of the same class
    pub observed_pure_count: usize,
    /// edges joining the two classes; the classical runs statistic is this plus one
    pub cross_edge_count: usize,
    /// pure-edge count under each stratified permutation, in permutation order
    pub null_distribution: Vec<usize>,
    /// mean of the null distribution
    pub null_mean: f64,
    /// standard deviation of the null distribution (ddof = 1)
    pub null_sd: f64,
    /// fraction of null and observed at least as large as the observed count
    pub p_value: f64,
    /// strata
    pub num_strata: usize,
    /// strata holding both classes, the only ones permutation can change
    pub informative_strata: usize,
}

/// Number of edges whose endpoints carry the same label.
pub fn pure_edge_count(edges: &[MstEdge], labels: &[ClassLabel]) -> usize {
    edges.iter().filter(|e| labels[e.source] == labels[e.target]).count()
}

/// `(1 + #{null >= observed}) / (len(null) + 1)`; the observed statistic counts as one
/// draw from the null, so the value is never 0.
pub fn permutation_p_value(observed: usize, null: &[usize]) -> f64 {
    let extreme = null.iter().filter(|&&c| c >= observed).count();
    (1 + extreme) as f64 / (null.len() + 1) as f64
}

fn mean_sd(values: &[usize]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<usize>() as f64 / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    (mean, (ss / (n - 1.0)).sqrt())
}

fn validate(
    edges: &[MstEdge],
    labels: &[ClassLabel],
    strata: &[Stratum],
    classes: &[ClassLabel],
    num_permutations: usize,
) -> Result<()> {
    if num_permutations == 0 {
        return Err(CytofError::invalid_parameter("number of permutations must be positive"));
    }
    if labels.len() != strata.len() {
        return Err(CytofError::invalid_parameter(format!(
            "{} labels but {} strata",
            labels.len(),
            strata.len()
        )));
    }
    if let Some(e) = edges.iter().find(|e| e.source >= labels.len() || e.target >= labels.len()) {
        return Err(CytofError::invalid_parameter(format!(
            "edge ({}, {}) references a node outside 0..{}",
            e.source,
            e.target,
            labels.len()
        )));
    }

    let mut selected = classes.to_vec();
    selected.sort();
    selected.dedup();
    if selected.len() != 2 {
        return Err(CytofError::InvalidClassSelection(format!(
            "exactly two distinct classes are required, got {}",
            selected.len()
        )));
    }
    for c in &selected {
        if !labels.contains(c) {
            return Err(CytofError::InvalidClassSelection(format!(
                "class {} has no nodes",
                c.0
            )));
        }
    }
    if let Some((node, l)) = labels.iter().enumerate().find(|(_, l)| !selected.contains(l)) {
        return Err(CytofError::InvalidClassSelection(format!(
            "node {} has class {}, outside the tested pair",
            node, l.0
        )));
    }
    Ok(())
}

/// Run the donor-stratified Friedman-Rafsky test.
///
/// `labels[i]` and `strata[i]` describe node `i` of the spanning tree `edges`; every
/// label must be one of the two `classes`.
pub fn friedman_rafsky_test(
    edges: &[MstEdge],
    labels: &[ClassLabel],
    strata: &[Stratum],
    classes: &[ClassLabel],
    num_permutations: usize,
    seed: u64,
) -> Result<FrTestResult> {
    friedman_rafsky_test_with_cancellation(NoOpSnoop, edges, labels, strata, classes, num_permutations, seed)
}

/// Friedman-Rafsky test that checks `snoop` for cancellation after every permutation and
/// reports one unit of progress per permutation.
pub fn friedman_rafsky_test_with_cancellation(
    snoop: impl CancelProgress,
    edges: &[MstEdge],
    labels: &[ClassLabel],
    strata: &[Stratum],
    classes: &[ClassLabel],
    num_permutations: usize,
    seed: u64,
) -> Result<FrTestResult> {
    validate(edges, labels, strata, classes, num_permutations)?;
    snoop.check()?;

    let observed = pure_edge_count(edges, labels);
    let permuter = StratifiedPermuter::new(labels, strata);
    if permuter.informative_strata() == 0 {
        warn!("no stratum holds both classes; the permutation null is degenerate");
    }

    snoop.set_total(num_permutations as u64);
    let null_distribution = (0..num_permutations)
        .into_par_iter()
        .map(|p| -> Result<usize> {
            let permuted = permuter.permute(labels, &mut permutation_stream(seed, p));
            let count = pure_edge_count(edges, &permuted);
            snoop.advance_check()?;
            Ok(count)
        })
        .collect::<Result<Vec<usize>>>()?;

    let (null_mean, null_sd) = mean_sd(&null_distribution);
    let p_value = permutation_p_value(observed, &null_distribution);
    info!(
        "Friedman-Rafsky: {} nodes, {} of {} edges pure (null mean {:.2}), p = {:.4}, {} of {} strata informative",
        labels.len(),
        observed,
        edges.len(),
        null_mean,
        p_value,
        permuter.informative_strata(),
        permuter.num_strata()
    );

    Ok(FrTestResult {
        num_nodes: labels.len(),
        num_edges: edges.len(),
        observed_pure_count: observed,
        cross_edge_count: edges.len() - observed,
        null_distribution,
        null_mean,
        null_sd,
        p_value,
        num_strata: permuter.num_strata(),
        informative_strata: permuter.informative_strata(),
    })
}
