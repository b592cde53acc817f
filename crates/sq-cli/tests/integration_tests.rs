//! End-to-end tests driving the pgsquash binary.
//!
//! The PostgreSQL tools are replaced by small shell scripts configured through
//! pgsquash.yml, so no database is needed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

// ── Helpers ────────────────────────────────────────────────────────────

fn pgsquash_bin() -> String {
    env!("CARGO_BIN_EXE_pgsquash").to_string()
}

fn run_in(dir: &Path, dsn: Option<&str>, args: &[&str]) -> Output {
    let mut cmd = Command::new(pgsquash_bin());
    cmd.current_dir(dir)
        .args(args)
        .env_remove("POSTGRES_DSN")
        .env_remove("RUST_LOG")
        .env("RUST_LOG_STYLE", "never");
    if let Some(dsn) = dsn {
        cmd.env("POSTGRES_DSN", dsn);
    }
    cmd.output()
        .unwrap_or_else(|e| panic!("Failed to run pgsquash in {}: {}", dir.display(), e))
}

fn project_with_migrations() -> TempDir {
    let temp = tempdir().unwrap();
    let migrations = temp.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    fs::write(migrations.join("001_a.up.sql"), "CREATE TABLE a (id int);\n").unwrap();
    fs::write(migrations.join("001_a.down.sql"), "DROP TABLE a;\n").unwrap();
    temp
}

fn snapshot(dir: &Path) -> BTreeMap<String, String> {
    if !dir.exists() {
        return BTreeMap::new();
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .map(|p| {
            (
                p.file_name().unwrap().to_string_lossy().into_owned(),
                fs::read_to_string(&p).unwrap(),
            )
        })
        .collect()
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Install fake psql/pg_dump scripts and point pgsquash.yml at them
#[cfg(unix)]
fn install_fake_tools(root: &Path, dump: &str) {
    let bin = root.join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_script(&bin.join("psql"), "echo 1");
    fs::write(root.join("dump.sql"), dump).unwrap();
    write_script(&bin.join("pg_dump"), &format!("cat '{}'", root.join("dump.sql").display()));
    fs::write(
        root.join("pgsquash.yml"),
        format!(
            "psql_bin: {}\npg_dump_bin: {}\n",
            bin.join("psql").display(),
            bin.join("pg_dump").display()
        ),
    )
    .unwrap();
}

const DUMP: &str = "SET foo = 1;\n-- comment\nCREATE TABLE t (id int);\n\n\n";

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_missing_dsn_exits_1_without_touching_files() {
    let project = project_with_migrations();
    let before = snapshot(&project.path().join("migrations"));

    let output = run_in(project.path(), None, &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ERROR]"), "stdout: {stdout}");
    assert!(stdout.contains("POSTGRES_DSN"), "stdout: {stdout}");
    assert_eq!(snapshot(&project.path().join("migrations")), before);
    assert!(!project.path().join("migrations_backup").exists());
}

#[test]
fn test_unreachable_psql_exits_1() {
    let project = project_with_migrations();
    fs::write(
        project.path().join("pgsquash.yml"),
        "psql_bin: /nonexistent/pgsquash/psql\n",
    )
    .unwrap();

    let output = run_in(project.path(), Some("postgres://u:p@localhost/db"), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cannot connect to database"), "stdout: {stdout}");
    assert!(!project.path().join("migrations_backup").exists());
}

#[test]
fn test_help_mentions_dry_run() {
    let temp = tempdir().unwrap();
    let output = run_in(temp.path(), None, &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("POSTGRES_DSN"));
}

#[cfg(unix)]
#[test]
fn test_dry_run_previews_and_writes_nothing() {
    let project = project_with_migrations();
    install_fake_tools(project.path(), DUMP);
    let before = snapshot(&project.path().join("migrations"));

    let output = run_in(project.path(), Some("postgres://u:p@localhost/db"), &["--dry-run"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("[DRY-RUN] [INFO] Would backup migrations"), "stdout: {stdout}");
    assert!(stdout.contains("--- Preview of 001_initial_schema.up.sql (first 30 lines) ---"));
    assert!(stdout.contains("CREATE TABLE t (id int);"));
    assert!(!stdout.contains("NEXT STEPS"));
    assert_eq!(snapshot(&project.path().join("migrations")), before);
    assert!(!project.path().join("migrations_backup").exists());
}

#[cfg(unix)]
#[test]
fn test_full_run_writes_baseline_and_backup() {
    let project = project_with_migrations();
    install_fake_tools(project.path(), DUMP);
    let before = snapshot(&project.path().join("migrations"));

    let output = run_in(project.path(), Some("postgres://u:p@localhost/db"), &[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("NEXT STEPS:"));
    assert!(!stdout.contains("[DRY-RUN]"));

    let after = snapshot(&project.path().join("migrations"));
    assert_eq!(
        after.keys().collect::<Vec<_>>(),
        ["001_initial_schema.down.sql", "001_initial_schema.up.sql"]
    );
    assert!(after["001_initial_schema.up.sql"].ends_with("\nCREATE TABLE t (id int);\n"));
    assert_eq!(snapshot(&project.path().join("migrations_backup")), before);
}

#[cfg(unix)]
#[test]
fn test_directory_flags_redirect_paths() {
    let project = tempdir().unwrap();
    let custom = project.path().join("db/migrate");
    fs::create_dir_all(&custom).unwrap();
    fs::write(custom.join("001_x.up.sql"), "CREATE TABLE x ();\n").unwrap();
    install_fake_tools(project.path(), DUMP);

    let output = run_in(
        project.path(),
        Some("postgres://u:p@localhost/db"),
        &["--migrations-dir", "db/migrate", "--backup-dir", "db/old"],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(snapshot(&custom).len(), 2);
    assert!(project.path().join("db/old/001_x.up.sql").exists());
    assert!(!project.path().join("migrations").exists());
}

#[test]
fn test_backup_dir_aliasing_migrations_is_rejected() {
    let project = project_with_migrations();
    let before = snapshot(&project.path().join("migrations"));

    let output = run_in(
        project.path(),
        Some("postgres://u:p@localhost/db"),
        &["--backup-dir", "./migrations"],
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("must differ"), "stdout: {stdout}");
    assert_eq!(snapshot(&project.path().join("migrations")), before);
}
