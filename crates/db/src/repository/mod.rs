//! Repository functions — one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic, just SQL and the decoding of rows into records.
//! Each mutating function is a single statement, so it commits on its own.

pub mod runs;
pub mod workflows;
