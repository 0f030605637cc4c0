/// Friedman-Rafsky statistic, permutation null and p-value
pub mod friedman_rafsky;
/// Stratified label permutation
pub mod permute;


pub use crate::friedman_rafsky::{
    friedman_rafsky_test, friedman_rafsky_test_with_cancellation, permutation_p_value, pure_edge_count, FrTestResult,
};
pub use crate::permute::{permutation_stream, StratifiedPermuter};
