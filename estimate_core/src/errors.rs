//! # Error Types
//!
//! Structured error types for estimate_core. Errors fall into two groups:
//!
//! - **Row-level** errors ([`EstimateError::MalformedRecord`]) are recoverable.
//!   The batch processor logs them, skips the record and keeps going.
//! - **Batch-level** errors ([`EstimateError::InputUnavailable`],
//!   [`EstimateError::EmptyBatch`]) abort the run and are reported to the
//!   caller with a distinguishing reason.
//!
//! Unknown catalog pairs are never errors; they are priced with the fallback
//! unit cost (see [`crate::catalog`]).
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::errors::{EstimateError, EstimateResult};
//!
//! fn require_rows(rows: usize) -> EstimateResult<()> {
//!     if rows == 0 {
//!         return Err(EstimateError::empty_batch("no valid takeoff rows"));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_rows(0).unwrap_err();
//! assert_eq!(err.error_code(), "EMPTY_BATCH");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for estimate_core operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Structured error type for estimation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EstimateError {
    /// The takeoff source cannot be located or opened
    #[error("Input unavailable: '{path}' - {reason}")]
    InputUnavailable { path: String, reason: String },

    /// A single record could not be turned into a line item
    #[error("Malformed record {record}: field '{field}' = '{value}' - {reason}")]
    MalformedRecord {
        record: usize,
        field: String,
        value: String,
        reason: String,
    },

    /// Nothing valid was left to estimate
    #[error("Empty batch: {reason}")]
    EmptyBatch { reason: String },

    /// The rich document backend could not produce output
    #[error("Renderer unavailable: {renderer} - {reason}")]
    RendererUnavailable { renderer: String, reason: String },

    /// A configuration or API input value is invalid
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error on something other than the primary input
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/CSV serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch in a catalog or settings file
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EstimateError {
    /// Create an InputUnavailable error
    pub fn input_unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::InputUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MalformedRecord error. `record` is 1-based.
    pub fn malformed_record(
        record: usize,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EstimateError::MalformedRecord {
            record,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an EmptyBatch error
    pub fn empty_batch(reason: impl Into<String>) -> Self {
        EstimateError::EmptyBatch {
            reason: reason.into(),
        }
    }

    /// Create a RendererUnavailable error
    pub fn renderer_unavailable(renderer: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::RendererUnavailable {
            renderer: renderer.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        EstimateError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Whether processing can continue past this error.
    ///
    /// Malformed records are skipped and a missing document backend falls
    /// back to plain text; everything else stops the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EstimateError::MalformedRecord { .. } | EstimateError::RendererUnavailable { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EstimateError::InputUnavailable { .. } => "INPUT_UNAVAILABLE",
            EstimateError::MalformedRecord { .. } => "MALFORMED_RECORD",
            EstimateError::EmptyBatch { .. } => "EMPTY_BATCH",
            EstimateError::RendererUnavailable { .. } => "RENDERER_UNAVAILABLE",
            EstimateError::InvalidInput { .. } => "INVALID_INPUT",
            EstimateError::FileError { .. } => "FILE_ERROR",
            EstimateError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EstimateError::VersionMismatch { .. } => "VERSION_MISMATCH",
            EstimateError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for command-line front ends.
    ///
    /// The two batch-level failures get their own codes so scripts can tell
    /// "could not read the takeoff" apart from "nothing in it was priceable".
    pub fn exit_code(&self) -> u8 {
        match self {
            EstimateError::InputUnavailable { .. } => 2,
            EstimateError::EmptyBatch { .. } => 3,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for EstimateError {
    fn from(e: serde_json::Error) -> Self {
        EstimateError::serialization(e.to_string())
    }
}
