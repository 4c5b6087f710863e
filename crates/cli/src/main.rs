//! `flowline` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server.
//! - `migrate`  — run pending database migrations.
//! - `validate` — validate a workflow JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use db::{MemoryStore, SqlStore, Store};
use engine::{NewWorkflow, WorkflowService};
use steps::SimulatedStep;

/// `--database-url` value that selects the in-process store.
const MEMORY_DATABASE: &str = "memory";

#[derive(Parser)]
#[command(name = "flowline", about = "Minimal sequential workflow runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve(ServeArgs),
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "FLOWLINE_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// SQLite URL, or `memory` for a store that lives as long as the process.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://workflow.db?mode=rwc")]
    database_url: String,

    #[arg(long, env = "FLOWLINE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// How long each simulated step takes.
    #[arg(long, env = "FLOWLINE_STEP_DELAY_MS", default_value_t = 200)]
    step_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cli=info,api=info,engine=info,db=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Migrate { database_url } => {
            info!("Running migrations against {database_url}");
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool)
                .await
                .context("migration failed")?;
            info!("Migrations applied successfully");
            Ok(())
        }
        Command::Validate { path } => validate(&path),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let store: Arc<dyn Store> = if args.database_url == MEMORY_DATABASE {
        info!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = db::pool::create_pool(&args.database_url, args.max_connections)
            .await
            .context("failed to connect to database")?;
        db::pool::run_migrations(&pool)
            .await
            .context("migration failed")?;
        Arc::new(SqlStore::new(pool))
    };

    let runner = SimulatedStep::new(Duration::from_millis(args.step_delay_ms));
    info!(step_delay = ?runner.delay(), "Starting API server on {}", args.bind);

    let service = WorkflowService::new(store, Arc::new(runner));
    api::serve(&args.bind, service)
        .await
        .context("server error")
}

fn validate(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content).context("invalid JSON")?;

    match NewWorkflow::from_json(&value) {
        Ok(workflow) => {
            println!(
                "✅ Workflow '{}' is valid. Steps: {:?}",
                workflow.name(),
                workflow.steps()
            );
            Ok(())
        }
        Err(e) => bail!("❌ Validation failed: {e}"),
    }
}
