//! Workflow create/read operations.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{models::Workflow, DbError, DbPool};

/// Raw `workflows` row; steps are kept as a JSON array in `steps_json`.
#[derive(Debug, FromRow)]
struct WorkflowRecord {
    id: i64,
    name: String,
    steps_json: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<WorkflowRecord> for Workflow {
    type Error = DbError;

    fn try_from(record: WorkflowRecord) -> Result<Self, Self::Error> {
        let steps: Vec<String> = serde_json::from_str(&record.steps_json).map_err(|e| {
            DbError::Corrupt(format!("workflow {} has unreadable steps: {e}", record.id))
        })?;

        Ok(Workflow {
            id: record.id,
            name: record.name,
            steps,
            created_at: record.created_at,
        })
    }
}

/// Insert a new workflow into the database.
///
/// Callers are expected to have validated `name` and `steps` already.
pub async fn create_workflow(
    pool: &DbPool,
    name: &str,
    steps: &[String],
) -> Result<Workflow, DbError> {
    let steps_json = serde_json::to_string(steps)
        .map_err(|e| DbError::Corrupt(format!("cannot encode steps: {e}")))?;
    let now = Utc::now();

    let record = sqlx::query_as::<_, WorkflowRecord>(
        r#"
        INSERT INTO workflows (name, steps_json, created_at)
        VALUES (?1, ?2, ?3)
        RETURNING id, name, steps_json, created_at
        "#,
    )
    .bind(name)
    .bind(&steps_json)
    .bind(now)
    .fetch_one(pool)
    .await?;

    record.try_into()
}

/// Fetch a single workflow by its primary key.
pub async fn get_workflow(pool: &DbPool, id: i64) -> Result<Option<Workflow>, DbError> {
    sqlx::query_as::<_, WorkflowRecord>(
        "SELECT id, name, steps_json, created_at FROM workflows WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .map(Workflow::try_from)
    .transpose()
}

/// Return all workflows ordered by creation time (newest first).
pub async fn list_workflows(pool: &DbPool) -> Result<Vec<Workflow>, DbError> {
    let records = sqlx::query_as::<_, WorkflowRecord>(
        r#"
        SELECT id, name, steps_json, created_at
        FROM workflows
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    records.into_iter().map(Workflow::try_from).collect()
}
