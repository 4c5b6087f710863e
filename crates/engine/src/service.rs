//! `WorkflowService`, what callers (the HTTP layer, the CLI) talk to.
//!
//! Registration and the read-only projections are thin passes over the
//! store; triggering a run delegates to [`RunExecutor`] and waits for it.

use std::sync::Arc;

use tracing::{info, instrument};

use db::{RunLedger, Store, WorkflowStore};
use steps::StepRunner;

use crate::{EngineError, NewWorkflow, Run, RunDetail, RunExecutor, Workflow};

#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn Store>,
    executor: RunExecutor,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Store>, runner: Arc<dyn StepRunner>) -> Self {
        let executor = RunExecutor::new(Arc::clone(&store), runner);
        Self { store, executor }
    }

    /// Persist a validated workflow.
    #[instrument(skip(self, workflow), fields(name = workflow.name()))]
    pub async fn create_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, EngineError> {
        let created = self
            .store
            .create_workflow(workflow.name(), workflow.steps())
            .await?;
        info!(workflow_id = created.id, steps = created.steps.len(), "workflow registered");
        Ok(created)
    }

    /// All workflows with their steps, newest first.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, EngineError> {
        Ok(self.store.list_workflows().await?)
    }

    pub async fn get_workflow(&self, id: i64) -> Result<Workflow, EngineError> {
        self.store
            .get_workflow(id)
            .await?
            .ok_or(EngineError::NotFound { entity: "workflow", id })
    }

    /// Run a workflow to completion and return the terminal run.
    pub async fn trigger_run(&self, workflow_id: i64) -> Result<Run, EngineError> {
        self.executor.trigger(workflow_id).await
    }

    /// A run and its ordered logs, read as one consistent view.
    pub async fn get_run(&self, run_id: i64) -> Result<RunDetail, EngineError> {
        let (run, logs) = self
            .store
            .snapshot(run_id)
            .await?
            .ok_or(EngineError::NotFound { entity: "run", id: run_id })?;
        Ok(RunDetail { run, logs })
    }
}
