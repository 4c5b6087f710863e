//! Storage traits the engine is written against, plus the SQL-backed
//! implementation.
//!
//! Components receive an `Arc<dyn Store>` instead of reaching for a global
//! pool, so tests can swap in [`crate::MemoryStore`].

use async_trait::async_trait;

use crate::{
    models::{Run, RunLog, RunStatus, Workflow},
    repository::{runs as run_repo, workflows as wf_repo},
    DbError, DbPool,
};

/// Durable mapping from workflow identity to its name and steps.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persist a new workflow and return it with its assigned id.
    async fn create_workflow(&self, name: &str, steps: &[String]) -> Result<Workflow, DbError>;

    /// All workflows, most recently created first.
    async fn list_workflows(&self) -> Result<Vec<Workflow>, DbError>;

    async fn get_workflow(&self, id: i64) -> Result<Option<Workflow>, DbError>;
}

/// Durable record of runs and their append-only logs.
#[async_trait]
pub trait RunLedger: Send + Sync {
    /// Create a `PENDING` run.  Fails with [`DbError::NotFound`] if the
    /// workflow does not exist.
    async fn create_run(&self, workflow_id: i64) -> Result<Run, DbError>;

    /// Append a log line.  Fails with [`DbError::NotFound`] if the run does
    /// not exist.
    async fn append_log(&self, run_id: i64, message: &str) -> Result<RunLog, DbError>;

    /// Advance a run's status, setting `finished_at` iff the new status is
    /// terminal.  Fails with [`DbError::InvalidTransition`] if the move is
    /// not a forward lifecycle step.
    async fn update_status(&self, run_id: i64, status: RunStatus) -> Result<Run, DbError>;

    async fn get_run(&self, run_id: i64) -> Result<Option<Run>, DbError>;

    /// Logs of a run, oldest first.
    async fn get_logs(&self, run_id: i64) -> Result<Vec<RunLog>, DbError>;

    /// A run and its logs read as one consistent view.
    async fn snapshot(&self, run_id: i64) -> Result<Option<(Run, Vec<RunLog>)>, DbError>;
}

/// Everything the engine needs from persistence.
pub trait Store: WorkflowStore + RunLedger {}

impl<T: WorkflowStore + RunLedger> Store for T {}

// ---------------------------------------------------------------------------
// SqlStore
// ---------------------------------------------------------------------------

/// [`Store`] backed by the SQLite pool and the repository functions.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl WorkflowStore for SqlStore {
    async fn create_workflow(&self, name: &str, steps: &[String]) -> Result<Workflow, DbError> {
        wf_repo::create_workflow(&self.pool, name, steps).await
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, DbError> {
        wf_repo::list_workflows(&self.pool).await
    }

    async fn get_workflow(&self, id: i64) -> Result<Option<Workflow>, DbError> {
        wf_repo::get_workflow(&self.pool, id).await
    }
}

#[async_trait]
impl RunLedger for SqlStore {
    async fn create_run(&self, workflow_id: i64) -> Result<Run, DbError> {
        run_repo::create_run(&self.pool, workflow_id).await
    }

    async fn append_log(&self, run_id: i64, message: &str) -> Result<RunLog, DbError> {
        run_repo::append_log(&self.pool, run_id, message).await
    }

    async fn update_status(&self, run_id: i64, status: RunStatus) -> Result<Run, DbError> {
        run_repo::update_run_status(&self.pool, run_id, status).await
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<Run>, DbError> {
        run_repo::get_run(&self.pool, run_id).await
    }

    async fn get_logs(&self, run_id: i64) -> Result<Vec<RunLog>, DbError> {
        run_repo::list_logs(&self.pool, run_id).await
    }

    async fn snapshot(&self, run_id: i64) -> Result<Option<(Run, Vec<RunLog>)>, DbError> {
        run_repo::get_run_with_logs(&self.pool, run_id).await
    }
}
