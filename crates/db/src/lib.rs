//! `db` crate — pure persistence layer.
//!
//! Provides a connection pool, the stored record types, repository functions
//! for every table in the schema, and the [`WorkflowStore`] / [`RunLedger`]
//! traits the engine is written against.  No business logic lives here.

pub mod error;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repository;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use models::{Run, RunLog, RunStatus, Workflow};
pub use pool::DbPool;
pub use store::{RunLedger, SqlStore, Store, WorkflowStore};
