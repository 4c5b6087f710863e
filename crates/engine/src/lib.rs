//! `engine` crate — workflow validation, the run executor, and the service
//! façade the HTTP layer talks to.

pub mod error;
pub mod executor;
pub mod models;
pub mod service;
pub mod validation;

pub use error::EngineError;
pub use executor::RunExecutor;
pub use models::{NewWorkflow, Run, RunDetail, RunLog, RunStatus, Workflow};
pub use service::WorkflowService;
pub use validation::validate_workflow;

#[cfg(test)]
mod executor_tests;
