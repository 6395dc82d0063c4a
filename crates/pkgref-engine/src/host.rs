//! The host-environment seam consumed by the batch engine.
//!
//! The original tool ran inside a development environment that supplied file
//! selection, source-control checkout, a status bar, and an output window.
//! The engine only ever sees this trait; hosts (the CLI, tests) implement it.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::MigrateError;

/// Capabilities the engine needs from its surrounding host.
///
/// Implementations must tolerate concurrent calls: workers report progress
/// and log from the rayon pool. Sinks should serialize internally or be
/// inherently append-safe.
pub trait HostEnvironment: Sync {
    /// Resolves the project file that owns `path`, if the host knows one.
    ///
    /// Consulted for reference-migration targets whose
    /// [`MigrationTarget::project_path`](pkgref_core::MigrationTarget) was
    /// not resolved at selection time.
    fn owning_project_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf>;

    /// Makes `path` writable, checking it out of source control if needed.
    ///
    /// Called after a transformation succeeds and before the file is saved
    /// or deleted. A denial fails that file only.
    fn ensure_editable(&self, path: &Utf8Path) -> Result<(), MigrateError>;

    /// Reports monotonically increasing batch progress.
    fn report_progress(&self, done: usize, total: usize, message: &str);

    /// Reports the final, user-facing status line for the batch.
    fn report_final_status(&self, message: &str);

    /// Writes a detail line to the host's log sink.
    fn log(&self, message: &str);
}
