use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use engine::{validation::INVALID_DEFINITION, NewWorkflow, Workflow};

use super::{parse_id, timestamp, AppState};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct CreatedWorkflowDto {
    pub id: i64,
    pub name: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowDto {
    pub id: i64,
    pub name: String,
    pub steps: Vec<String>,
    pub created_at: String,
}

impl From<Workflow> for WorkflowDto {
    fn from(wf: Workflow) -> Self {
        Self {
            created_at: timestamp(&wf.created_at),
            id: wf.id,
            name: wf.name,
            steps: wf.steps,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WorkflowDto>>, ApiError> {
    let workflows = state.service.list_workflows().await?;
    Ok(Json(workflows.into_iter().map(WorkflowDto::from).collect()))
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WorkflowDto>, ApiError> {
    let id = parse_id(&id, "workflow")?;
    let workflow = state.service.get_workflow(id).await?;
    Ok(Json(workflow.into()))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedWorkflowDto>), ApiError> {
    // A missing or unparsable body is treated like an empty definition.
    let Json(payload) = payload.map_err(|_| ApiError::bad_request(INVALID_DEFINITION))?;
    let definition = NewWorkflow::from_json(&payload)?;

    let wf = state.service.create_workflow(definition).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedWorkflowDto {
            id: wf.id,
            name: wf.name,
            steps: wf.steps,
        }),
    ))
}
