//! Shared types for the cytof-rs workspace: samples, categorical labels and errors.

pub mod category;
pub mod error;
pub mod sample;

pub use category::{group_indices, Category, ClassLabel, Codebook, Stratum};
pub use error::{CytofError, Result};
pub use sample::{Experiment, ExperimentBuilder, Sample};
