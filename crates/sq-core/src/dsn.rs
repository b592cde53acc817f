//! PostgreSQL connection string resolution

use crate::error::{CoreError, CoreResult, DSN_EXAMPLE};
use std::fmt;

/// Environment variable holding the connection string
pub const DSN_ENV_VAR: &str = "POSTGRES_DSN";

/// Scheme written by golang-migrate style tooling
const SHORT_SCHEME: &str = "postgres://";

/// Scheme expected by `psql` and `pg_dump`
const LONG_SCHEME: &str = "postgresql://";

/// A normalized connection string, resolved once per run.
///
/// `Display` and `Debug` mask the password so the value can be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn(String);

impl Dsn {
    /// Read `POSTGRES_DSN` from the process environment
    pub fn from_env() -> CoreResult<Self> {
        Self::resolve(std::env::var(DSN_ENV_VAR).ok())
    }

    /// Resolve an optional raw value, treating empty as missing
    pub fn resolve(raw: Option<String>) -> CoreResult<Self> {
        match raw {
            Some(value) if !value.trim().is_empty() => Ok(Self::normalize(&value)),
            _ => Err(CoreError::DsnMissing {
                var: DSN_ENV_VAR,
                example: DSN_EXAMPLE,
            }),
        }
    }

    /// Rewrite a leading `postgres://` to `postgresql://`, leaving the rest untouched
    pub fn normalize(raw: &str) -> Self {
        match raw.strip_prefix(SHORT_SCHEME) {
            Some(rest) => Dsn(format!("{LONG_SCHEME}{rest}")),
            None => Dsn(raw.to_string()),
        }
    }

    /// The full connection string, password included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Connection string with the password replaced by `***`
    pub fn redacted(&self) -> String {
        let Some(scheme_end) = self.0.find("://") else {
            return self.0.clone();
        };
        let authority_start = scheme_end + 3;
        let authority_end = self.0[authority_start..]
            .find(['/', '?'])
            .map_or(self.0.len(), |i| authority_start + i);
        let authority = &self.0[authority_start..authority_end];

        let Some(at) = authority.rfind('@') else {
            return self.0.clone();
        };
        let userinfo = &authority[..at];
        let Some(colon) = userinfo.find(':') else {
            return self.0.clone();
        };

        format!(
            "{}{}:***{}",
            &self.0[..authority_start],
            &userinfo[..colon],
            &self.0[authority_start + at..]
        )
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dsn").field(&self.redacted()).finish()
    }
}

#[cfg(test)]
#[path = "dsn_test.rs"]
mod tests;
