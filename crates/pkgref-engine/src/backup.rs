//! Scoped `.bak` backup creation ahead of destructive file mutation.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::MigrateError;

/// A verified sibling backup of a file about to be mutated.
///
/// [`create`](Self::create) copies `path` to `path + ".bak"`, overwriting any
/// prior backup, and verifies the copy is a readable regular file before
/// returning. If creation fails the caller never reaches the mutation.
///
/// The guard deliberately carries no rollback: recovery from the `.bak`
/// artifact is a manual operator step, because the project+manifest pair has
/// no cheap atomic multi-file restore.
#[derive(Debug)]
pub struct BackupGuard {
    original: Utf8PathBuf,
    backup: Utf8PathBuf,
}

impl BackupGuard {
    /// Copies `path` to its `.bak` sibling and verifies the result.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Backup`] if the copy fails or the backup is
    /// not a readable regular file afterwards. The original file is
    /// untouched in either case.
    pub fn create(path: &Utf8Path) -> Result<Self, MigrateError> {
        let backup = Utf8PathBuf::from(format!("{path}.bak"));

        fs::copy(path.as_std_path(), backup.as_std_path())
            .map_err(|e| MigrateError::backup(path, e))?;

        // Mutation must only proceed against a backup that actually exists
        // and can be read back.
        let metadata =
            fs::metadata(backup.as_std_path()).map_err(|e| MigrateError::backup(path, e))?;
        if !metadata.is_file() {
            return Err(MigrateError::backup(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "backup is not a regular file"),
            ));
        }

        debug!(original = %path, backup = %backup, "Backup created");

        Ok(Self {
            original: path.to_owned(),
            backup,
        })
    }

    /// Returns the path of the file being protected.
    #[inline]
    #[must_use]
    pub fn original(&self) -> &Utf8Path {
        &self.original
    }

    /// Returns the path of the `.bak` copy.
    #[inline]
    #[must_use]
    pub fn backup_path(&self) -> &Utf8Path {
        &self.backup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_dir(dir: &tempfile::TempDir) -> Option<Utf8PathBuf> {
        Utf8Path::from_path(dir.path()).map(Utf8Path::to_owned)
    }

    #[test]
    fn test_backup_copies_content() -> Result<(), MigrateError> {
        let dir = tempfile::tempdir().map_err(|e| MigrateError::io("tempdir", e))?;
        let Some(base) = utf8_dir(&dir) else {
            return Ok(());
        };
        let file = base.join("packages.config");
        fs::write(file.as_std_path(), "<packages/>").map_err(|e| MigrateError::io(&file, e))?;

        let guard = BackupGuard::create(&file)?;
        assert_eq!(guard.original(), file);
        assert_eq!(guard.backup_path(), base.join("packages.config.bak"));

        let copied = fs::read_to_string(guard.backup_path().as_std_path())
            .map_err(|e| MigrateError::io(guard.backup_path(), e))?;
        assert_eq!(copied, "<packages/>");
        Ok(())
    }

    #[test]
    fn test_backup_overwrites_stale_backup() -> Result<(), MigrateError> {
        let dir = tempfile::tempdir().map_err(|e| MigrateError::io("tempdir", e))?;
        let Some(base) = utf8_dir(&dir) else {
            return Ok(());
        };
        let file = base.join("app.config");
        let stale = base.join("app.config.bak");
        fs::write(file.as_std_path(), "current").map_err(|e| MigrateError::io(&file, e))?;
        fs::write(stale.as_std_path(), "stale").map_err(|e| MigrateError::io(&stale, e))?;

        let guard = BackupGuard::create(&file)?;
        let copied = fs::read_to_string(guard.backup_path().as_std_path())
            .map_err(|e| MigrateError::io(guard.backup_path(), e))?;
        assert_eq!(copied, "current");
        Ok(())
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let result = BackupGuard::create(Utf8Path::new("/nonexistent/dir/packages.config"));
        assert!(matches!(result, Err(MigrateError::Backup { .. })));
    }
}
