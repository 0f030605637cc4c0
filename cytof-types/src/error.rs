use snoop::CancellationError;
use thiserror::Error;

/// Errors raised by the partition, featurization, graph and testing stages.
///
/// Every variant is terminal for the requested computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CytofError {
    #[error("requested {requested} partitions but only {distinct} distinct points were supplied")]
    InsufficientData { requested: usize, distinct: usize },

    #[error("sample '{sample_id}' contains no cells")]
    EmptySample { sample_id: String },

    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("graph over {nodes} nodes has {components} connected components; a spanning tree needs one")]
    DisconnectedGraph { nodes: usize, components: usize },

    #[error("invalid class selection: {0}")]
    InvalidClassSelection(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("duplicate sample id '{sample_id}'")]
    DuplicateSample { sample_id: String },

    #[error(transparent)]
    Cancelled(#[from] CancellationError),
}

impl CytofError {
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, found: usize) -> Self {
        CytofError::DimensionMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        CytofError::InvalidParameter(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CytofError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = CytofError::EmptySample {
            sample_id: "donor3_IFNg".to_string(),
        };
        assert_eq!(err.to_string(), "sample 'donor3_IFNg' contains no cells");

        let err = CytofError::InsufficientData {
            requested: 200,
            distinct: 17,
        };
        assert!(err.to_string().contains("200"));
        assert!(err.to_string().contains("17"));

        let err: CytofError = CancellationError.into();
        assert_eq!(err, CytofError::Cancelled(CancellationError));
        assert_eq!(err.to_string(), "computation was cancelled");
    }
}
