//! `MockStep`, a test double for `StepRunner`.
//!
//! Records every step it is asked to run and fails on the labels it was
//! told to.  An optional gate lets a test hold a run mid-step and inspect
//! its in-flight state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::{StepContext, StepError, StepRunner};

/// A step runner that succeeds unless the step label was registered with
/// [`MockStep::failing_on`].
#[derive(Debug, Clone, Default)]
pub struct MockStep {
    failures: HashMap<String, String>,
    gate: Option<Arc<Semaphore>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockStep {
    /// A mock that succeeds on every step.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Fail with `message` whenever a step labelled `step` runs.
    pub fn failing_on(mut self, step: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(step.into(), message.into());
        self
    }

    /// Block each step until a permit is added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Step labels seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of steps this runner has started.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl StepRunner for MockStep {
    async fn run(&self, step: &str, _ctx: &StepContext) -> Result<(), StepError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(step.to_owned());

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| StepError::new("mock gate closed"))?
                .forget();
        }

        match self.failures.get(step) {
            Some(message) => Err(StepError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(index: usize) -> StepContext {
        StepContext { workflow_id: 1, run_id: 1, index, total: 3 }
    }

    #[tokio::test]
    async fn records_calls_and_fails_on_configured_step() {
        let mock = MockStep::succeeding().failing_on("boom", "something broke irreparably");

        assert!(mock.run("ok", &ctx(1)).await.is_ok());
        let err = mock.run("boom", &ctx(2)).await.unwrap_err();

        assert_eq!(err.to_string(), "something broke irreparably");
        assert_eq!(mock.calls(), vec!["ok", "boom"]);
    }

    #[tokio::test]
    async fn gated_step_waits_for_permit() {
        let (mock, gate) = MockStep::succeeding().gated();
        let runner = mock.clone();
        let handle = tokio::spawn(async move { runner.run("held", &ctx(1)).await });

        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        gate.add_permits(1);
        handle.await.unwrap().unwrap();
        assert_eq!(mock.call_count(), 1);
    }
}
