//! Engine-level error types.

use db::{DbError, RunStatus};
use thiserror::Error;

/// Errors produced by the workflow engine (validation + execution).
///
/// Step failures are not here: the executor turns them into a `FAILED` run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed workflow definition.
    #[error("{0}")]
    Validation(String),

    /// The referenced workflow or run does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A status update went against the run lifecycle.  Indicates a bug.
    #[error("run {run_id}: invalid status transition {from} -> {to}")]
    InvalidTransition {
        run_id: i64,
        from: RunStatus,
        to: RunStatus,
    },

    /// The task executing a run panicked or was shut down.
    #[error("run {run_id} aborted: {reason}")]
    Aborted { run_id: i64, reason: String },

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(DbError),
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::NotFound { entity, id },
            DbError::InvalidTransition { run_id, from, to } => {
                Self::InvalidTransition { run_id, from, to }
            }
            other => Self::Database(other),
        }
    }
}
