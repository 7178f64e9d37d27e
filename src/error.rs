//! Error types for the segmentation engine

use thiserror::Error;

/// Result type alias for segmentation operations
pub type Result<T> = std::result::Result<T, SegmentasiError>;

/// Main error type for the segmentation engine
#[derive(Error, Debug)]
pub enum SegmentasiError {
    /// Required columns are absent from the uploaded table. Non-retryable
    /// without a corrected source file.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// The clustering algorithm could not produce the requested number of
    /// groups. The previous assignment, if any, is left untouched.
    #[error("clustering failed: {0}")]
    ClusteringFailed(String),

    /// A prediction or view was requested before a successful clustering run.
    #[error("no fitted model available, run clustering first")]
    StaleModel,

    #[error("data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl SegmentasiError {
    /// Shorthand for the parameter-rejection case checked before any
    /// computation runs.
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        SegmentasiError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for SegmentasiError {
    fn from(err: polars::error::PolarsError) -> Self {
        SegmentasiError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for SegmentasiError {
    fn from(err: serde_json::Error) -> Self {
        SegmentasiError::SerializationError(err.to_string())
    }
}
