//! The `StepRunner` trait: the contract every step executor must fulfil.

use async_trait::async_trait;

use crate::StepError;

/// Where a step sits within its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    /// ID of the parent workflow.
    pub workflow_id: i64,
    /// ID of the current run.
    pub run_id: i64,
    /// 1-based position of the step.
    pub index: usize,
    /// Number of steps in the workflow.
    pub total: usize,
}

/// Performs the unit of work behind a step descriptor.
///
/// Implementations must not block the async runtime: other runs share it.
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Execute `step`, returning `Err` with a human-readable message on
    /// failure.
    async fn run(&self, step: &str, ctx: &StepContext) -> Result<(), StepError>;
}
