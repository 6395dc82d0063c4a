//! Console implementation of the engine's host surface.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use pkgref_engine::{HostEnvironment, MigrateError};
use tracing::{debug, info};

/// Project-file extensions recognized when resolving a manifest's owner.
const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

/// Host backed by the local filesystem and the tracing log.
///
/// Project resolution looks for exactly one project file next to the
/// manifest; zero or several candidates leave the target unresolved and the
/// engine reports it as missing a project. "Checkout" on a plain filesystem
/// means clearing the read-only attribute.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl HostEnvironment for ConsoleHost {
    fn owning_project_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        let dir = path.parent()?;
        let entries = fs::read_dir(dir.as_std_path()).ok()?;

        let mut candidates: Vec<Utf8PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let Ok(candidate) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            let is_project = candidate
                .extension()
                .is_some_and(|ext| PROJECT_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)));
            if is_project {
                candidates.push(candidate);
            }
        }

        match candidates.as_slice() {
            [only] => Some(only.clone()),
            [] => {
                debug!(%path, "No project file next to manifest");
                None
            }
            _ => {
                debug!(%path, count = candidates.len(), "Ambiguous project resolution");
                None
            }
        }
    }

    fn ensure_editable(&self, path: &Utf8Path) -> Result<(), MigrateError> {
        let metadata = fs::metadata(path.as_std_path())
            .map_err(|e| MigrateError::checkout(path, e.to_string()))?;

        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            fs::set_permissions(path.as_std_path(), permissions)
                .map_err(|e| MigrateError::checkout(path, e.to_string()))?;
            debug!(%path, "Cleared read-only attribute");
        }

        Ok(())
    }

    fn report_progress(&self, done: usize, total: usize, message: &str) {
        info!("[{done}/{total}] {message}");
    }

    fn report_final_status(&self, message: &str) {
        info!("{message}");
    }

    fn log(&self, message: &str) {
        info!("{message}");
    }
}
