//! `psql` / `pg_dump` invocations

use crate::error::{DbError, DbResult};
use crate::traits::{CommandOutput, CommandRunner};
use sq_core::{Dsn, Settings};
use std::sync::Arc;

/// Query used to check that the database answers
pub const PROBE_QUERY: &str = "SELECT 1";

/// `pg_dump` flags: structure only, without ownership, grants, tablespaces,
/// security labels or comments
pub const DUMP_FLAGS: [&str; 6] = [
    "--schema-only",
    "--no-owner",
    "--no-privileges",
    "--no-tablespaces",
    "--no-security-labels",
    "--no-comments",
];

/// PostgreSQL client tools, run through a [`CommandRunner`]
pub struct PgTools {
    runner: Arc<dyn CommandRunner>,
    psql_bin: String,
    pg_dump_bin: String,
}

impl PgTools {
    /// Use the tool binaries configured in `settings`
    pub fn new(runner: Arc<dyn CommandRunner>, settings: &Settings) -> Self {
        Self {
            runner,
            psql_bin: settings.psql_bin.clone(),
            pg_dump_bin: settings.pg_dump_bin.clone(),
        }
    }

    /// Run `SELECT 1` through psql; any failure is a connection error
    pub async fn probe(&self, dsn: &Dsn) -> DbResult<()> {
        let args = vec![
            dsn.as_str().to_string(),
            "-c".to_string(),
            PROBE_QUERY.to_string(),
        ];
        log::debug!("Running {} {} -c \"{PROBE_QUERY}\"", self.psql_bin, dsn);

        let output = self
            .runner
            .run(&self.psql_bin, &args)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        if output.success {
            Ok(())
        } else {
            Err(DbError::ConnectionError(failure_detail(&output)))
        }
    }

    /// Dump the schema-only definition of the database and return it as text
    pub async fn dump_schema(&self, dsn: &Dsn) -> DbResult<String> {
        let mut args = Vec::with_capacity(DUMP_FLAGS.len() + 1);
        args.push(dsn.as_str().to_string());
        args.extend(DUMP_FLAGS.iter().map(|flag| flag.to_string()));
        log::debug!("Running {} {} {}", self.pg_dump_bin, dsn, DUMP_FLAGS.join(" "));

        let output = self
            .runner
            .run(&self.pg_dump_bin, &args)
            .await
            .map_err(|e| DbError::DumpError(e.to_string()))?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(DbError::DumpError(failure_detail(&output)))
        }
    }
}

/// Operator-facing summary of a failed invocation
fn failure_detail(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        format!("exited with code {}", output.exit_code)
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
