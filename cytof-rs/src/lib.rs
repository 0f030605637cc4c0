//! # cytof-rs: partition featurization and Friedman-Rafsky testing of CyTOF samples
//!
//! Cells of every sample are pooled (a bounded number per sample) to fit a k-means
//! partition of receptor space. Each sample becomes the vector of its partition
//! occupancies, and pairs of stimulation conditions are compared with a donor-stratified
//! Friedman-Rafsky test on the minimum spanning tree of the occupancy distances.

/// Fit, featurize and test an experiment
pub mod analysis;
/// Bounded per-sample cell subsampling
pub mod downsample;
/// Partition occupancy vectors
pub mod featurize;

#[cfg(test)]
mod test;

pub use crate::analysis::{Analysis, AnalysisConfig, FittedAnalysis, PairTest};
pub use crate::downsample::downsample_cells;
pub use crate::featurize::{count_matrix, featurize, featurize_all, proportion_matrix, Occupancy};
