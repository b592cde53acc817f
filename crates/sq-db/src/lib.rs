//! sq-db - PostgreSQL tooling layer for pgsquash
//!
//! This crate provides the `CommandRunner` trait through which every external
//! program is launched, a tokio-backed implementation, and `PgTools`, which
//! builds the `psql` and `pg_dump` invocations the squash pipeline needs.

pub mod error;
pub mod postgres;
pub mod process;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use error::{DbError, DbResult};
pub use postgres::PgTools;
pub use process::ProcessRunner;
pub use traits::{CommandOutput, CommandRunner};
