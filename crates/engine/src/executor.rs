//! Run execution engine.
//!
//! `RunExecutor` drives one run through its lifecycle:
//! 1. Creates the run (`PENDING`) and immediately marks it `RUNNING`.
//! 2. Hands each step, strictly in order, to the configured `StepRunner`.
//! 3. Writes a `started` and a `completed` log line around every step, each
//!    committed on its own so pollers see progress while the run is live.
//! 4. On the first step error, logs `ERROR: <message>`, marks the run
//!    `FAILED` and stops.  Steps that already ran are not undone.
//! 5. Otherwise marks the run `COMPLETED`.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn, Instrument};

use db::{RunLedger, Store, WorkflowStore};
use steps::{StepContext, StepRunner};

use crate::{EngineError, Run, RunStatus, Workflow};

/// Orchestrator that runs workflows against a store and a step runner.
///
/// Holds no per-run state, so one executor can serve any number of
/// concurrent runs.
#[derive(Clone)]
pub struct RunExecutor {
    store: Arc<dyn Store>,
    runner: Arc<dyn StepRunner>,
}

impl RunExecutor {
    /// Create a new executor.
    pub fn new(store: Arc<dyn Store>, runner: Arc<dyn StepRunner>) -> Self {
        Self { store, runner }
    }

    /// Start a run of `workflow_id` and drive it to a terminal status.
    ///
    /// Returns the finished run; a `FAILED` run is still `Ok`.  Once the run
    /// exists it executes on its own task, so dropping the returned future
    /// (a client hanging up) does not stop it.
    ///
    /// # Errors
    /// [`EngineError::NotFound`] if the workflow does not exist, or any
    /// persistence error raised while recording progress.
    #[instrument(skip(self))]
    pub async fn trigger(&self, workflow_id: i64) -> Result<Run, EngineError> {
        let workflow = self
            .store
            .get_workflow(workflow_id)
            .await?
            .ok_or(EngineError::NotFound { entity: "workflow", id: workflow_id })?;

        let run_id = self.store.create_run(workflow.id).await?.id;

        let executor = self.clone();
        let handle = tokio::spawn(
            async move { executor.execute(&workflow, run_id).await }.in_current_span(),
        );

        handle
            .await
            .map_err(|e| EngineError::Aborted { run_id, reason: e.to_string() })?
    }

    /// Drive an existing `PENDING` run of `workflow` to a terminal status.
    #[instrument(skip(self, workflow), fields(workflow_id = workflow.id))]
    pub async fn execute(&self, workflow: &Workflow, run_id: i64) -> Result<Run, EngineError> {
        self.store.update_status(run_id, RunStatus::Running).await?;

        let total = workflow.steps.len();
        info!("run started: executing {total} steps");

        for (i, step) in workflow.steps.iter().enumerate() {
            let ctx = StepContext {
                workflow_id: workflow.id,
                run_id,
                index: i + 1,
                total,
            };

            self.store
                .append_log(run_id, &step_message(&ctx, step, "started"))
                .await?;

            match self.runner.run(step, &ctx).await {
                Ok(()) => {
                    self.store
                        .append_log(run_id, &step_message(&ctx, step, "completed"))
                        .await?;
                    debug!("step {}/{} '{}' completed", ctx.index, total, step);
                }

                Err(err) => {
                    warn!("step {}/{} '{}' failed: {}", ctx.index, total, step, err);

                    self.store.append_log(run_id, &format!("ERROR: {err}")).await?;
                    let run = self.store.update_status(run_id, RunStatus::Failed).await?;

                    info!("run {} failed at step {}/{}", run_id, ctx.index, total);
                    return Ok(run);
                }
            }
        }

        let run = self.store.update_status(run_id, RunStatus::Completed).await?;
        info!("run {} completed", run_id);
        Ok(run)
    }
}

/// `Step i/n: <step> - <phase>`
fn step_message(ctx: &StepContext, step: &str, phase: &str) -> String {
    format!("Step {}/{}: {} - {}", ctx.index, ctx.total, step, phase)
}
