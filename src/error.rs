//! Error types for rust_cluster3

use thiserror::Error;

/// Main error type for clustering operations
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Malformed or structurally inconsistent input. Fatal to the load;
    /// `line` is the 1-based line number in the input file.
    #[error("Error reading line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested analysis cannot run on this dataset, e.g. more clusters
    /// than elements. Isolated to the affected axis.
    #[error("Constraint violated: {reason}")]
    Constraint { reason: String },

    /// The numeric provider failed. Abandons only the affected output.
    #[error("Numeric provider error: {reason}")]
    Numeric { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },
}

impl ClusterError {
    /// Shorthand for a loader error at a given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ClusterError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for clustering operations
pub type Result<T> = std::result::Result<T, ClusterError>;
