//! k-means partitioning of receptor space
#![deny(missing_docs)]

/// Fitted partitions and nearest-centroid assignment
pub mod partition;

/// Lloyd's algorithm with seeded initialization and restarts
pub mod lloyd;


pub use lloyd::KMeans;
pub use partition::Partition;
