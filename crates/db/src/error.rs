//! Typed error type for the db crate.

use thiserror::Error;

use crate::models::RunStatus;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A status update would break the run lifecycle.
    #[error("run {run_id}: invalid status transition {from} -> {to}")]
    InvalidTransition {
        run_id: i64,
        from: RunStatus,
        to: RunStatus,
    },

    /// A stored value could not be decoded back into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl DbError {
    pub fn workflow_not_found(id: i64) -> Self {
        Self::NotFound { entity: "workflow", id }
    }

    pub fn run_not_found(id: i64) -> Self {
        Self::NotFound { entity: "run", id }
    }
}
