//! Squash command implementation
//!
//! A strictly linear pipeline: resolve the DSN, probe the database, back up
//! the current migrations, dump and clean the schema, generate the baseline
//! pair, then either write it or preview it. Any failure ends the run.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use sq_core::dsn::DSN_ENV_VAR;
use sq_core::{Dsn, DumpCleaner, MigrationFiles, MigrationPair, Settings};
use sq_db::{CommandRunner, PgTools, ProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::Cli;
use crate::commands::guidance;

/// What a completed run produced
#[derive(Debug)]
pub(crate) enum SquashOutcome {
    /// Files were replaced on disk
    Written { up_path: PathBuf, down_path: PathBuf },
    /// Dry run: nothing touched
    Previewed { pair: MigrationPair, preview: String },
}

/// Execute the squash command
pub async fn execute(args: &Cli) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    execute_with(
        args,
        std::env::var(DSN_ENV_VAR).ok(),
        &working_dir,
        Arc::new(ProcessRunner),
    )
    .await
}

/// Execute with the DSN value, working directory and runner supplied
pub(crate) async fn execute_with(
    args: &Cli,
    raw_dsn: Option<String>,
    working_dir: &Path,
    runner: Arc<dyn CommandRunner>,
) -> Result<()> {
    log::info!("=== Starting Migration Squash ===");

    let dsn = Dsn::resolve(raw_dsn)?;
    let settings = Settings::resolve(args.config.as_deref(), working_dir, &args.overrides())
        .context("Failed to resolve settings")?;

    let generated_at = Local::now().naive_local();
    let outcome = run(&settings, &dsn, runner, args.dry_run, generated_at).await?;

    match outcome {
        SquashOutcome::Written { up_path, down_path } => {
            log::info!("✓ Created {}", up_path.display());
            log::info!("✓ Created {}", down_path.display());
            log::info!("=== Migration Squash Complete ===");
            guidance::print_next_steps(&settings);
        }
        SquashOutcome::Previewed { pair, preview } => {
            let files = MigrationFiles::new(&settings);
            log::info!(
                "Would remove old migration files from {}",
                files.migrations_dir().display()
            );
            log::info!(
                "Would write {} bytes to {}",
                pair.up.len(),
                files.up_path().display()
            );
            log::info!(
                "Would write {} bytes to {}",
                pair.down.len(),
                files.down_path().display()
            );
            println!(
                "\n--- Preview of {} (first {} lines) ---",
                settings.up_file, settings.preview_lines
            );
            println!("{preview}");
            log::info!("=== Migration Squash Complete ===");
        }
    }
    Ok(())
}

/// Run every pipeline step after configuration resolution
pub(crate) async fn run(
    settings: &Settings,
    dsn: &Dsn,
    runner: Arc<dyn CommandRunner>,
    dry_run: bool,
    generated_at: NaiveDateTime,
) -> Result<SquashOutcome> {
    let pg = PgTools::new(runner, settings);
    let files = MigrationFiles::new(settings);

    log::info!("Testing database connection...");
    pg.probe(dsn).await?;
    log::info!("✓ Database connection successful");

    let receipt = if dry_run {
        log::info!("Would backup migrations to {}", files.backup_dir().display());
        None
    } else {
        log::info!(
            "Backing up existing migrations to {}...",
            files.backup_dir().display()
        );
        let receipt = files.backup().context("Failed to back up migrations")?;
        log::info!("✓ Backup complete ({} files)", receipt.entries().len());
        Some(receipt)
    };

    log::info!("Dumping current database schema...");
    let raw_dump = pg.dump_schema(dsn).await?;
    log::info!("✓ Schema dumped successfully");

    let cleaned = DumpCleaner::new(&settings.tracking_table).clean(&raw_dump);
    let pair = MigrationPair::build(&settings.project_name, &cleaned, generated_at)?;

    match receipt {
        Some(receipt) => {
            log::info!("Removing old migration files...");
            log::info!("Writing new migration files...");
            let (up_path, down_path) = files
                .replace(&receipt, &pair)
                .context("Failed to write new migrations")?;
            Ok(SquashOutcome::Written { up_path, down_path })
        }
        None => {
            let preview = pair.up_preview(settings.preview_lines);
            Ok(SquashOutcome::Previewed { pair, preview })
        }
    }
}

#[cfg(test)]
#[path = "squash_test.rs"]
mod tests;
