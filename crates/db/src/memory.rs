//! `MemoryStore` — a process-local [`Store`](crate::Store).
//!
//! Keeps every table behind one mutex, so each operation is atomic and
//! [`RunLedger::snapshot`] is trivially consistent.  Used as a test double
//! and for throwaway servers (`--database-url memory`).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    models::{Run, RunLog, RunStatus, Workflow},
    store::{RunLedger, WorkflowStore},
    DbError,
};

#[derive(Debug, Default)]
struct Tables {
    workflows: BTreeMap<i64, Workflow>,
    runs: BTreeMap<i64, Run>,
    logs: Vec<RunLog>,
    last_workflow_id: i64,
    last_run_id: i64,
    last_log_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still guards consistent tables.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn create_workflow(&self, name: &str, steps: &[String]) -> Result<Workflow, DbError> {
        let mut tables = self.lock();
        tables.last_workflow_id += 1;

        let workflow = Workflow {
            id: tables.last_workflow_id,
            name: name.to_owned(),
            steps: steps.to_vec(),
            created_at: Utc::now(),
        };
        tables.workflows.insert(workflow.id, workflow.clone());
        Ok(workflow)
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, DbError> {
        let tables = self.lock();
        let mut workflows: Vec<Workflow> = tables.workflows.values().cloned().collect();
        workflows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(workflows)
    }

    async fn get_workflow(&self, id: i64) -> Result<Option<Workflow>, DbError> {
        Ok(self.lock().workflows.get(&id).cloned())
    }
}

#[async_trait]
impl RunLedger for MemoryStore {
    async fn create_run(&self, workflow_id: i64) -> Result<Run, DbError> {
        let mut tables = self.lock();
        if !tables.workflows.contains_key(&workflow_id) {
            return Err(DbError::workflow_not_found(workflow_id));
        }
        tables.last_run_id += 1;

        let run = Run {
            id: tables.last_run_id,
            workflow_id,
            status: RunStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
        };
        tables.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn append_log(&self, run_id: i64, message: &str) -> Result<RunLog, DbError> {
        let mut tables = self.lock();
        if !tables.runs.contains_key(&run_id) {
            return Err(DbError::run_not_found(run_id));
        }
        tables.last_log_id += 1;

        let log = RunLog {
            id: tables.last_log_id,
            run_id,
            message: message.to_owned(),
            created_at: Utc::now(),
        };
        tables.logs.push(log.clone());
        Ok(log)
    }

    async fn update_status(&self, run_id: i64, status: RunStatus) -> Result<Run, DbError> {
        let mut tables = self.lock();
        let run = tables
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| DbError::run_not_found(run_id))?;

        if !run.status.can_transition_to(status) {
            return Err(DbError::InvalidTransition {
                run_id,
                from: run.status,
                to: status,
            });
        }

        run.status = status;
        run.finished_at = status.is_terminal().then(Utc::now);
        Ok(run.clone())
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<Run>, DbError> {
        Ok(self.lock().runs.get(&run_id).cloned())
    }

    async fn get_logs(&self, run_id: i64) -> Result<Vec<RunLog>, DbError> {
        Ok(logs_of(&self.lock(), run_id))
    }

    async fn snapshot(&self, run_id: i64) -> Result<Option<(Run, Vec<RunLog>)>, DbError> {
        let tables = self.lock();
        Ok(tables
            .runs
            .get(&run_id)
            .map(|run| (run.clone(), logs_of(&tables, run_id))))
    }
}

/// Logs are pushed in id order, which is also timestamp order.
fn logs_of(tables: &Tables, run_id: i64) -> Vec<RunLog> {
    tables
        .logs
        .iter()
        .filter(|log| log.run_id == run_id)
        .cloned()
        .collect()
}
