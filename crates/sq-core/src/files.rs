//! Backup and replacement of the migration file set.
//!
//! The destructive step is ordered behind the backup by construction:
//! [`MigrationFiles::replace`] needs a [`BackupReceipt`], and only
//! [`MigrationFiles::backup`] can produce one. New files are staged next to
//! the old ones and renamed into place, so a failure before the old files are
//! removed leaves the directory as it was.

use crate::config::Settings;
use crate::error::{CoreError, CoreResult};
use crate::generate::MigrationPair;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Staging directory created inside the migrations directory during write-out
pub const STAGING_DIR_NAME: &str = ".pgsquash-staging";

/// One file copied into the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// File name, identical in source and backup
    pub name: String,

    /// Byte length at copy time
    pub len: u64,
}

/// Proof that the pre-run migration set was copied to the backup directory
#[derive(Debug, Clone)]
pub struct BackupReceipt {
    backup_dir: PathBuf,
    entries: Vec<BackupEntry>,
}

impl BackupReceipt {
    /// Copied files, sorted by name
    pub fn entries(&self) -> &[BackupEntry] {
        &self.entries
    }

    /// Backup directory the files were written to
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Confirm every recorded copy is still present with the recorded size
    pub fn verify(&self) -> CoreResult<()> {
        for entry in &self.entries {
            let path = self.backup_dir.join(&entry.name);
            let meta = fs::metadata(&path).map_err(|e| CoreError::BackupMismatch {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            if meta.len() != entry.len {
                return Err(CoreError::BackupMismatch {
                    path: path.display().to_string(),
                    reason: format!("expected {} bytes, found {}", entry.len, meta.len()),
                });
            }
        }
        Ok(())
    }
}

/// Filesystem operations on the migrations and backup directories
#[derive(Debug, Clone)]
pub struct MigrationFiles {
    migrations_dir: PathBuf,
    backup_dir: PathBuf,
    up_file: String,
    down_file: String,
}

impl MigrationFiles {
    /// Bind to the directories and file names in `settings`
    pub fn new(settings: &Settings) -> Self {
        Self {
            migrations_dir: settings.migrations_dir.clone(),
            backup_dir: settings.backup_dir.clone(),
            up_file: settings.up_file.clone(),
            down_file: settings.down_file.clone(),
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Final path of the up-migration
    pub fn up_path(&self) -> PathBuf {
        self.migrations_dir.join(&self.up_file)
    }

    /// Final path of the down-migration
    pub fn down_path(&self) -> PathBuf {
        self.migrations_dir.join(&self.down_file)
    }

    /// `*.sql` files directly inside the migrations directory, sorted by path.
    /// A missing directory has no files.
    pub fn existing(&self) -> CoreResult<Vec<PathBuf>> {
        list_sql_files(&self.migrations_dir)
    }

    /// Copy every existing migration file into the backup directory,
    /// keeping names, permissions and timestamps.
    pub fn backup(&self) -> CoreResult<BackupReceipt> {
        fs::create_dir_all(&self.backup_dir).map_err(|e| CoreError::io(&self.backup_dir, e))?;
        if same_location(&self.migrations_dir, &self.backup_dir) {
            return Err(CoreError::BackupMismatch {
                path: self.backup_dir.display().to_string(),
                reason: format!(
                    "backup directory is the migrations directory '{}'",
                    self.migrations_dir.display()
                ),
            });
        }

        let mut entries = Vec::new();
        for src in self.existing()? {
            let Some(name) = src.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let dst = self.backup_dir.join(&name);
            let len = copy_preserving_times(&src, &dst)?;
            log::debug!("Backed up {} -> {}", src.display(), dst.display());
            entries.push(BackupEntry { name, len });
        }

        Ok(BackupReceipt {
            backup_dir: self.backup_dir.clone(),
            entries,
        })
    }

    /// Replace the migration set with `pair`. Returns the written paths.
    pub fn replace(
        &self,
        receipt: &BackupReceipt,
        pair: &MigrationPair,
    ) -> CoreResult<(PathBuf, PathBuf)> {
        receipt.verify()?;

        let staging = self.migrations_dir.join(STAGING_DIR_NAME);
        if staging.exists() {
            // Left over from an interrupted run
            fs::remove_dir_all(&staging).map_err(|e| CoreError::io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| CoreError::io(&staging, e))?;

        let staged_up = staging.join(&self.up_file);
        let staged_down = staging.join(&self.down_file);
        fs::write(&staged_up, &pair.up).map_err(|e| CoreError::io(&staged_up, e))?;
        fs::write(&staged_down, &pair.down).map_err(|e| CoreError::io(&staged_down, e))?;

        for old in self.existing()? {
            fs::remove_file(&old).map_err(|e| CoreError::io(&old, e))?;
            log::debug!("Removed {}", old.display());
        }

        let up_path = self.up_path();
        let down_path = self.down_path();
        fs::rename(&staged_up, &up_path).map_err(|e| CoreError::io(&up_path, e))?;
        fs::rename(&staged_down, &down_path).map_err(|e| CoreError::io(&down_path, e))?;
        fs::remove_dir(&staging).map_err(|e| CoreError::io(&staging, e))?;

        Ok((up_path, down_path))
    }
}

/// List `*.sql` files in `dir` (non-recursive), sorted
pub fn list_sql_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*.sql", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut files = Vec::new();
    let entries = glob::glob(&pattern).map_err(|e| CoreError::ConfigInvalid {
        message: format!("invalid migrations directory pattern '{pattern}': {e}"),
    })?;
    for entry in entries {
        let path = entry.map_err(|e| {
            CoreError::io(e.path(), io::Error::new(e.error().kind(), e.to_string()))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Absolute form of `path`: `.` and `..` folded, symlinks resolved for the
/// part that exists, missing trailing components appended as written.
pub fn resolve_location(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    let mut resolved = loop {
        if let Ok(canonical) = existing.canonicalize() {
            break canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break existing.to_path_buf(),
        }
    };
    for name in missing.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Whether `a` and `b` name the same location once resolved
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (resolve_location(a), resolve_location(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Copy `src` to `dst`, then carry over timestamps and permissions
fn copy_preserving_times(src: &Path, dst: &Path) -> CoreResult<u64> {
    // Creating dst would truncate src when both name the same file
    if dst.exists() && same_location(src, dst) {
        return Err(CoreError::BackupMismatch {
            path: dst.display().to_string(),
            reason: format!("'{}' and its backup are the same file", src.display()),
        });
    }

    let mut reader = fs::File::open(src).map_err(|e| CoreError::io(src, e))?;
    let meta = reader.metadata().map_err(|e| CoreError::io(src, e))?;
    let mut writer = fs::File::create(dst).map_err(|e| CoreError::io(dst, e))?;
    let len = io::copy(&mut reader, &mut writer).map_err(|e| CoreError::io(dst, e))?;

    let mut times = fs::FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    writer.set_times(times).map_err(|e| CoreError::io(dst, e))?;
    drop(writer);

    // Permissions last: a read-only source would otherwise block set_times
    fs::set_permissions(dst, meta.permissions()).map_err(|e| CoreError::io(dst, e))?;
    Ok(len)
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
