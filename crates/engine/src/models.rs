//! Domain types the engine exposes.
//!
//! Stored records come from the `db` crate unchanged; this module adds the
//! validated input for registration and the run-detail projection.

use serde_json::Value;

pub use db::{Run, RunLog, RunStatus, Workflow};

use crate::{validation, EngineError};

/// A workflow definition that has passed validation and can be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkflow {
    name: String,
    steps: Vec<String>,
}

impl NewWorkflow {
    /// Validate `name` and `steps`.
    ///
    /// # Errors
    /// [`EngineError::Validation`] if the name is empty or there are no steps.
    pub fn new(name: impl Into<String>, steps: Vec<String>) -> Result<Self, EngineError> {
        let name = name.into();
        validation::validate_workflow(&name, &steps)?;
        Ok(Self { name, steps })
    }

    /// Build from a JSON object of the form `{"name": "...", "steps": ["...", ...]}`.
    ///
    /// # Errors
    /// [`EngineError::Validation`] if `name` is not a non-empty string or
    /// `steps` is not a non-empty array of strings.
    pub fn from_json(value: &Value) -> Result<Self, EngineError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(validation::invalid_definition)?;

        let steps = value
            .get("steps")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_owned))
                    .collect::<Option<Vec<String>>>()
            })
            .ok_or_else(validation::invalid_definition)?;

        Self::new(name, steps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

/// A run together with its logs, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDetail {
    pub run: Run,
    pub logs: Vec<RunLog>,
}
