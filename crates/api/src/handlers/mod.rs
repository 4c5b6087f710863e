//! Route handlers and the state they share.

pub mod runs;
pub mod workflows;

use std::sync::Arc;

use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use engine::WorkflowService;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WorkflowService>,
}

impl AppState {
    pub fn new(service: WorkflowService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Liveness probe; checks nothing.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// ISO-8601 in UTC with a trailing `Z`.
pub(crate) fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Ids are integers; anything else names a resource that cannot exist.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(entity))
}
