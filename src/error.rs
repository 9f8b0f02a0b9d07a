use thiserror::Error;

/// Error types for the k-means stepping engine.
///
/// Every variant is a caller error detected before any output is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KMeansError {
    /// The dataset contains no points
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The number of clusters k is invalid (k == 0, or k > n for sampled methods)
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Manual centroids do not match the requested number of clusters
    #[error("Expected {expected} centroids, got {got}")]
    CentroidCountMismatch { expected: usize, got: usize },

    /// Shape or type violation in caller-supplied data
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A session operation was called before its prerequisite
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),

    /// A session operation that needs a fresh run was called after
    /// centroids were already placed
    #[error("Already initialized: {0}")]
    AlreadyInitialized(&'static str),
}

impl KMeansError {
    /// Stable snake_case name of the error kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            KMeansError::EmptyDataset => "empty_dataset",
            KMeansError::InvalidK(_) => "invalid_k",
            KMeansError::CentroidCountMismatch { .. } => "centroid_count_mismatch",
            KMeansError::MalformedInput(_) => "malformed_input",
            KMeansError::NotInitialized(_) => "not_initialized",
            KMeansError::AlreadyInitialized(_) => "already_initialized",
        }
    }
}
