//! `SimulatedStep` — the reference runner: every step is a fixed delay.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{StepContext, StepError, StepRunner};

/// Default time a simulated step takes.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(200);

/// Sleeps for `delay` and always succeeds.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedStep {
    delay: Duration,
}

impl SimulatedStep {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedStep {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

#[async_trait]
impl StepRunner for SimulatedStep {
    async fn run(&self, step: &str, ctx: &StepContext) -> Result<(), StepError> {
        debug!(run_id = ctx.run_id, step, delay = ?self.delay, "simulating step");
        // Yields to the runtime instead of parking the worker thread.
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
