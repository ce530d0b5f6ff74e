//! Error handling for the fusion engine.
//!
//! Only conditions that make a run impossible are errors. Everything a run can
//! survive (unresolved names, duplicate registry rows, suspicious rates) is
//! recorded as an [`Anomaly`](crate::report::Anomaly) in the run report instead.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::schema::ColumnRole;

/// Specialized error type for the fusion engine
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// A required column role could not be found in the input table
    #[error("Structural validation failed: missing {role} ({detail})")]
    StructuralValidation {
        /// The role that could not be assigned
        role: ColumnRole,
        /// What the detector saw instead
        detail: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// The boundary registry could not be built from its source table
    #[error("Registry error: {0}")]
    Registry(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error (de)serializing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FusionError {
    /// Build a structural validation error for a missing role
    pub fn missing_role(role: ColumnRole, detail: impl Into<String>) -> Self {
        Self::StructuralValidation {
            role,
            detail: detail.into(),
        }
    }

    /// Whether the error aborted a run because the input table was unusable
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralValidation { .. })
    }
}

/// Result type for fusion operations
pub type Result<T> = std::result::Result<T, FusionError>;
