//! Sample distance matrices, complete sample graphs and their minimum spanning trees.

/// Distance metrics and pairwise distance matrices
pub mod distance;

/// Complete weighted graphs over samples
pub mod graph;

/// Minimum spanning trees with a reproducible tie-break
pub mod mst;

pub use distance::{pairwise_distances, DistanceMetric};
pub use graph::{build_graph, SampleGraph};
pub use mst::{minimum_spanning_tree, total_weight, MstEdge};
