//! sq-core - Core library for pgsquash
//!
//! Everything the squash pipeline does that does not involve talking to the
//! database: resolving settings and the connection string, cleaning a
//! `pg_dump` schema dump, rendering the baseline migration pair, and the
//! backup / write-out steps on the migrations directory.

pub mod clean;
pub mod config;
pub mod dsn;
pub mod error;
pub mod files;
pub mod generate;

pub use clean::DumpCleaner;
pub use config::{Settings, SettingsOverrides};
pub use dsn::Dsn;
pub use error::{CoreError, CoreResult};
pub use files::{BackupReceipt, MigrationFiles};
pub use generate::MigrationPair;
