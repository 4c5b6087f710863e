//! Run and run-log repository functions.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};

use crate::{
    models::{Run, RunLog, RunStatus},
    DbError, DbPool,
};

#[derive(Debug, FromRow)]
struct RunRecord {
    id: i64,
    workflow_id: i64,
    status: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<RunRecord> for Run {
    type Error = DbError;

    fn try_from(record: RunRecord) -> Result<Self, Self::Error> {
        let status = record
            .status
            .parse::<RunStatus>()
            .map_err(|e| DbError::Corrupt(format!("run {}: {e}", record.id)))?;

        Ok(Run {
            id: record.id,
            workflow_id: record.workflow_id,
            status,
            started_at: record.started_at,
            finished_at: record.finished_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RunLogRecord {
    id: i64,
    run_id: i64,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<RunLogRecord> for RunLog {
    fn from(record: RunLogRecord) -> Self {
        RunLog {
            id: record.id,
            run_id: record.run_id,
            message: record.message,
            created_at: record.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// runs
// ---------------------------------------------------------------------------

/// Create a new run in `PENDING` status for an existing workflow.
///
/// The existence check and the insert are one statement, so a run can never
/// reference a missing workflow.
pub async fn create_run(pool: &DbPool, workflow_id: i64) -> Result<Run, DbError> {
    let now = Utc::now();

    sqlx::query_as::<_, RunRecord>(
        r#"
        INSERT INTO runs (workflow_id, status, started_at)
        SELECT ?1, ?2, ?3
        WHERE EXISTS (SELECT 1 FROM workflows WHERE id = ?1)
        RETURNING id, workflow_id, status, started_at, finished_at
        "#,
    )
    .bind(workflow_id)
    .bind(RunStatus::Pending.as_str())
    .bind(now)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::workflow_not_found(workflow_id))?
    .try_into()
}

/// Move a run to `status`, stamping `finished_at` when `status` is terminal.
///
/// The update only applies while the run is still in the predecessor state
/// of `status`, so concurrent writers cannot push a run backwards or past a
/// terminal state.
pub async fn update_run_status(
    pool: &DbPool,
    run_id: i64,
    status: RunStatus,
) -> Result<Run, DbError> {
    let Some(from) = status.predecessor() else {
        return Err(rejected_transition(pool, run_id, status).await);
    };
    let finished_at = status.is_terminal().then(Utc::now);

    let updated = sqlx::query_as::<_, RunRecord>(
        r#"
        UPDATE runs
        SET status = ?1, finished_at = ?2
        WHERE id = ?3 AND status = ?4
        RETURNING id, workflow_id, status, started_at, finished_at
        "#,
    )
    .bind(status.as_str())
    .bind(finished_at)
    .bind(run_id)
    .bind(from.as_str())
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(record) => record.try_into(),
        None => Err(rejected_transition(pool, run_id, status).await),
    }
}

/// Work out why an update to `to` matched no row.
async fn rejected_transition(pool: &DbPool, run_id: i64, to: RunStatus) -> DbError {
    match fetch_run(pool, run_id).await {
        Ok(Some(run)) => DbError::InvalidTransition {
            run_id,
            from: run.status,
            to,
        },
        Ok(None) => DbError::run_not_found(run_id),
        Err(e) => e,
    }
}

/// Fetch a single run by its primary key.
pub async fn get_run(pool: &DbPool, run_id: i64) -> Result<Option<Run>, DbError> {
    fetch_run(pool, run_id).await
}

async fn fetch_run<'e>(
    executor: impl SqliteExecutor<'e>,
    run_id: i64,
) -> Result<Option<Run>, DbError> {
    sqlx::query_as::<_, RunRecord>(
        "SELECT id, workflow_id, status, started_at, finished_at FROM runs WHERE id = ?1",
    )
    .bind(run_id)
    .fetch_optional(executor)
    .await?
    .map(Run::try_from)
    .transpose()
}

// ---------------------------------------------------------------------------
// run_logs
// ---------------------------------------------------------------------------

/// Append a log line to an existing run.
pub async fn append_log(pool: &DbPool, run_id: i64, message: &str) -> Result<RunLog, DbError> {
    let now = Utc::now();

    let record = sqlx::query_as::<_, RunLogRecord>(
        r#"
        INSERT INTO run_logs (run_id, message, created_at)
        SELECT ?1, ?2, ?3
        WHERE EXISTS (SELECT 1 FROM runs WHERE id = ?1)
        RETURNING id, run_id, message, created_at
        "#,
    )
    .bind(run_id)
    .bind(message)
    .bind(now)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::run_not_found(run_id))?;

    Ok(record.into())
}

/// Return the logs of a run in insertion order.  Ids come from an
/// AUTOINCREMENT key, so they never go backwards even if the clock does.
pub async fn list_logs(pool: &DbPool, run_id: i64) -> Result<Vec<RunLog>, DbError> {
    fetch_logs(pool, run_id).await
}

async fn fetch_logs<'e>(
    executor: impl SqliteExecutor<'e>,
    run_id: i64,
) -> Result<Vec<RunLog>, DbError> {
    let records = sqlx::query_as::<_, RunLogRecord>(
        r#"
        SELECT id, run_id, message, created_at
        FROM run_logs
        WHERE run_id = ?1
        ORDER BY id ASC
        "#,
    )
    .bind(run_id)
    .fetch_all(executor)
    .await?;

    Ok(records.into_iter().map(RunLog::from).collect())
}

/// Read a run together with its logs inside one transaction.
pub async fn get_run_with_logs(
    pool: &DbPool,
    run_id: i64,
) -> Result<Option<(Run, Vec<RunLog>)>, DbError> {
    let mut tx = pool.begin().await?;

    let snapshot = match fetch_run(&mut *tx, run_id).await? {
        Some(run) => {
            let logs = fetch_logs(&mut *tx, run_id).await?;
            Some((run, logs))
        }
        None => None,
    };

    tx.commit().await?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pool, repository::workflows};

    #[tokio::test]
    async fn logs_follow_insertion_order_when_the_clock_goes_backwards() {
        let pool = pool::create_pool("sqlite::memory:", 1).await.unwrap();
        pool::run_migrations(&pool).await.unwrap();
        let wf = workflows::create_workflow(&pool, "wf", &["one".to_owned()]).await.unwrap();
        let run = create_run(&pool, wf.id).await.unwrap();

        let now = Utc::now();
        for (message, at) in [
            ("first", now),
            ("second", now - chrono::Duration::seconds(30)),
            ("third", now - chrono::Duration::seconds(60)),
        ] {
            sqlx::query("INSERT INTO run_logs (run_id, message, created_at) VALUES (?1, ?2, ?3)")
                .bind(run.id)
                .bind(message)
                .bind(at)
                .execute(&pool)
                .await
                .unwrap();
        }

        let messages: Vec<String> = list_logs(&pool, run.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);

        let (_, snapshot) = get_run_with_logs(&pool, run.id).await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].message, "first");
    }
}
