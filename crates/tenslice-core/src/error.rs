use thiserror::Error;

/// Error taxonomy for tensor construction, view manipulation, and indexing.
#[derive(Error, Debug, Clone)]
pub enum TensorError {
    #[error("too many indices for tensor of dimension {rank}: {got} specified")]
    TooManyIndices { got: usize, rank: usize },

    #[error("shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    #[error("index {index} is out of bounds for dimension {dim} with size {size}")]
    IndexOutOfBounds { index: i64, dim: usize, size: usize },

    #[error("invalid axis {axis} for tensor with {rank} dimensions")]
    InvalidAxis { axis: i64, rank: usize },

    #[error("invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("incompatible devices in operation '{operation}': {expected} and {got}")]
    DeviceMismatch {
        operation: String,
        expected: String,
        got: String,
    },
}

impl TensorError {
    pub fn too_many_indices(got: usize, rank: usize) -> Self {
        Self::TooManyIndices { got, rank }
    }

    pub fn shape_mismatch(operation: &str, expected: impl ToString, got: impl ToString) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub fn index_out_of_bounds(index: i64, dim: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, dim, size }
    }

    pub fn invalid_axis(axis: i64, rank: usize) -> Self {
        Self::InvalidAxis { axis, rank }
    }

    pub fn invalid_argument(operation: &str, reason: impl ToString) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn device_mismatch(operation: &str, expected: impl ToString, got: impl ToString) -> Self {
        Self::DeviceMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TensorError>;
