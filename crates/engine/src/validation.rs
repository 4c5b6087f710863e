//! Workflow validation: run this before persisting a workflow.
//!
//! Rules enforced:
//! 1. The name must be non-empty.
//! 2. There must be at least one step.
//!
//! Step labels themselves are opaque and accepted as-is.

use crate::EngineError;

/// Message returned for every malformed workflow definition.
pub const INVALID_DEFINITION: &str = "Provide: name (string), steps (non-empty list)";

/// Validate a workflow's name and step list.
///
/// # Errors
/// [`EngineError::Validation`] if either rule is broken.
pub fn validate_workflow(name: &str, steps: &[String]) -> Result<(), EngineError> {
    if name.is_empty() || steps.is_empty() {
        return Err(invalid_definition());
    }
    Ok(())
}

pub(crate) fn invalid_definition() -> EngineError {
    EngineError::Validation(INVALID_DEFINITION.to_owned())
}
