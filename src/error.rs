//! Error types for stratasplit.

use std::path::PathBuf;

/// Result type alias for stratasplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while splitting a column.
///
/// Every variant aborts the split call that produced it; no partially
/// labeled output is ever returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The invocation was malformed: wrong column count, unsupported column
    /// type, nulls in the stratification column or a fraction outside
    /// `[0, 1]`.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// A row could not be mapped to a class inside the resolved domain.
    #[error("Classification error at row {row}: {message}")]
    Classification {
        /// Global row index of the offending value.
        row: u64,
        /// What went wrong.
        message: String,
    },

    /// A class has fewer distinct rows than the sampler was asked to pick.
    #[error("Sampling exhausted for class {class}: requested {requested}, only {available} distinct rows")]
    SamplingExhaustion {
        /// Class id being sampled.
        class: u32,
        /// Number of rows requested for the test group.
        requested: usize,
        /// Number of distinct rows available.
        available: usize,
    },

    /// Column not found in schema.
    #[error("Column '{name}' not found in schema")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// Empty dataset error.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Schema mismatch between batches or partitions.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error during file operations.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Serialization error for configs and reports.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a classification error for a global row.
    pub fn classification(row: u64, message: impl Into<String>) -> Self {
        Self::Classification {
            row,
            message: message.into(),
        }
    }

    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// True for errors raised before any partition work was scheduled.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
