//! Result envelope for callers that speak JSON or callbacks
//!
//! Serializes as `{"success": <payload>}` or
//! `{"error": {"kind": "...", "message": "..."}}`; the `error` key is the
//! only discriminator a caller needs. Validation errors also list each
//! rejected field under `details`.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::{CatalogError, RowViolation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Success(T),
    Error(ErrorBody),
}

/// Structured error description carried by [`Envelope::Error`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ViolationDetail>>,
}

/// One rejected field of a bulk-insert record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationDetail {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl From<&RowViolation> for ViolationDetail {
    fn from(violation: &RowViolation) -> Self {
        Self {
            row: violation.row,
            field: violation.error.field().to_string(),
            message: violation.error.to_string(),
        }
    }
}

impl<T> Envelope<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn into_result(self) -> Result<T, ErrorBody> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Error(body) => Err(body),
        }
    }
}

impl From<&CatalogError> for ErrorBody {
    fn from(err: &CatalogError) -> Self {
        let details = match err {
            CatalogError::Validation(violations) => {
                Some(violations.iter().map(ViolationDetail::from).collect())
            }
            _ => None,
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

impl<T> From<Result<T, CatalogError>> for Envelope<T> {
    fn from(result: Result<T, CatalogError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Error(ErrorBody::from(&err)),
        }
    }
}

/// Run a catalog operation in the background and deliver its outcome to
/// `callback`.
///
/// The callback is `FnOnce` and is called exactly once, with either
/// variant. Must be called from within a tokio runtime.
pub fn spawn_with_callback<T, F, C>(operation: F, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T, CatalogError>> + Send + 'static,
    C: FnOnce(Envelope<T>) + Send + 'static,
{
    tokio::spawn(async move {
        let envelope = Envelope::from(operation.await);
        callback(envelope);
    })
}
