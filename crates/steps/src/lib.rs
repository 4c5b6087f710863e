//! `steps` crate — the `StepRunner` trait and built-in step runners.
//!
//! The engine hands every step of a run to a [`StepRunner`] and drives the
//! run's lifecycle from the returned `Result`.  Swapping the runner changes
//! what a step *does* without touching the state machine.

pub mod error;
pub mod mock;
pub mod simulated;
pub mod traits;

pub use error::StepError;
pub use simulated::SimulatedStep;
pub use traits::{StepContext, StepRunner};
