//! Structured error types for shopsdb-core.
//!
//! Every catalog operation returns `Result<T, CatalogError>`; nothing is
//! raised past the operation boundary. The binary crate wraps these in
//! `anyhow` for reporting.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fixed message reported when the seed script hits a duplicate key.
pub const DUPLICATED_MESSAGE: &str = "Data has been duplicated!";

/// Main error type for catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A single-entity lookup matched no row
    #[error("not found: {resource} '{key}'")]
    NotFound { resource: &'static str, key: String },

    /// Seed data collided with existing unique keys
    #[error("{}", DUPLICATED_MESSAGE)]
    Duplicated,

    /// One or more bulk-insert records failed validation
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<RowViolation>),

    /// The pool could not hand out a connection
    #[error("failed to acquire connection: {0}")]
    Acquire(#[source] sqlx::Error),

    /// The operation exceeded the configured query timeout
    #[error("operation '{operation}' timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Any other storage failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A schema or seed script could not be read
    #[error("failed to read script {path:?}: {source}")]
    Script {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Stable discriminator used in serialized error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Duplicated => "duplicated",
            Self::Validation(_) => "validation",
            Self::Acquire(_) => "acquire",
            Self::Timeout { .. } => "timeout",
            Self::Database(_) => "database",
            Self::Script { .. } => "script",
            Self::Config { .. } => "config",
        }
    }

    /// True when the underlying database error is a unique or primary key
    /// violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Validation failure for one field of one bulk-insert record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowViolation {
    /// Zero-based position of the record in the submitted batch
    pub row: usize,
    pub error: ValidationError,
}

impl fmt::Display for RowViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

/// Validation error for entity fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Numeric field is below its allowed minimum
    OutOfRange {
        field: &'static str,
        min: i64,
        value: i64,
    },
}

impl ValidationError {
    /// Name of the rejected field
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::OutOfRange { field, .. } => *field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::OutOfRange { field, min, value } => {
                write!(f, "{} must be at least {} (got {})", field, min, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn join_violations(violations: &[RowViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
