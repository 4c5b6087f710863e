use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use engine::{RunDetail, RunStatus};

use super::{parse_id, timestamp, AppState};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct RunOutcomeDto {
    pub run_id: i64,
    pub status: RunStatus,
}

#[derive(Debug, Serialize)]
pub struct RunLogDto {
    pub time: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RunDto {
    pub run_id: i64,
    pub workflow_id: i64,
    pub status: RunStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub logs: Vec<RunLogDto>,
}

impl From<RunDetail> for RunDto {
    fn from(RunDetail { run, logs }: RunDetail) -> Self {
        Self {
            run_id: run.id,
            workflow_id: run.workflow_id,
            status: run.status,
            started_at: timestamp(&run.started_at),
            finished_at: run.finished_at.as_ref().map(timestamp),
            logs: logs
                .into_iter()
                .map(|log| RunLogDto {
                    time: timestamp(&log.created_at),
                    message: log.message,
                })
                .collect(),
        }
    }
}

/// Run the workflow synchronously; responds once the run is terminal.
pub async fn trigger(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RunOutcomeDto>, ApiError> {
    let workflow_id = parse_id(&id, "workflow")?;
    let run = state.service.trigger_run(workflow_id).await?;

    Ok(Json(RunOutcomeDto {
        run_id: run.id,
        status: run.status,
    }))
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RunDto>, ApiError> {
    let run_id = parse_id(&id, "run")?;
    let detail = state.service.get_run(run_id).await?;
    Ok(Json(detail.into()))
}
