//! Records stored by the persistence layer.
//!
//! These are the shapes every [`crate::store`] backend hands back.  The
//! engine works on them directly; the HTTP layer projects them into its own
//! response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

/// A registered workflow: a name plus an ordered list of opaque step labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    pub steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// runs
// ---------------------------------------------------------------------------

/// Lifecycle of a run: `Pending -> Running -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The only status a run may hold immediately before entering `self`.
    ///
    /// `Pending` is the initial status and has no predecessor.
    pub fn predecessor(self) -> Option<RunStatus> {
        match self {
            Self::Pending => None,
            Self::Running => Some(Self::Pending),
            Self::Completed | Self::Failed => Some(Self::Running),
        }
    }

    pub fn can_transition_to(self, next: RunStatus) -> bool {
        next.predecessor() == Some(self)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING"   => Ok(Self::Pending),
            "RUNNING"   => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED"    => Ok(Self::Failed),
            other       => Err(format!("unknown run status: {other}")),
        }
    }
}

/// One execution attempt of a workflow.
///
/// `finished_at` is `Some` exactly when `status` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub workflow_id: i64,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// run_logs
// ---------------------------------------------------------------------------

/// An append-only progress or error message attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    pub id: i64,
    pub run_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
