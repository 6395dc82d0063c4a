//! Batch execution: filename filtering, the busy flag, and the worker pool.
//!
//! One orchestrator runs one batch at a time. Eligible files are migrated on
//! a bounded rayon pool; each worker backs its files up, transforms them in
//! memory, and only then asks the host to make them editable and writes the
//! result. Failures stay scoped to their file.

use std::fs;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use pkgref_core::{MigrationKind, MigrationTarget};
use pkgref_xml::XmlDocument;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::backup::BackupGuard;
use crate::error::MigrateError;
use crate::host::HostEnvironment;
use crate::redirects::merge_redirects;
use crate::refs::migrate_references;
use crate::report::{BatchReport, MigrationOutcome};

/// Settings for one batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// The transformation to apply.
    pub kind: MigrationKind,
    /// Upper bound on worker threads. Clamped to at least one and to the
    /// machine's available parallelism.
    pub max_parallelism: usize,
}

impl BatchConfig {
    /// Creates a config for `kind` with parallelism bounded by the machine.
    #[must_use]
    pub fn new(kind: MigrationKind) -> Self {
        Self {
            kind,
            max_parallelism: available_threads(),
        }
    }

    /// Overrides the worker-thread bound.
    #[must_use]
    pub const fn with_max_parallelism(mut self, max: usize) -> Self {
        self.max_parallelism = max;
        self
    }

    fn thread_count(&self) -> usize {
        self.max_parallelism.max(1).min(available_threads())
    }
}

fn available_threads() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Runs migration batches, at most one at a time.
///
/// The busy flag lives on the orchestrator rather than in process-global
/// state, so independent orchestrators (separate hosts, tests) never
/// contend. A second [`run`](Self::run) while one is in flight fails fast
/// with [`MigrateError::Busy`] and touches no files.
#[derive(Debug, Default)]
pub struct BatchOrchestrator {
    busy: AtomicBool,
}

impl BatchOrchestrator {
    /// Creates an idle orchestrator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Returns `true` while a batch is in flight.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one batch over `targets`.
    ///
    /// Files whose name does not match the kind's filter are skipped without
    /// an outcome. The returned report holds one outcome per eligible file,
    /// in input order; per-file errors land there rather than here.
    ///
    /// # Errors
    ///
    /// - [`MigrateError::Busy`] when a batch is already running.
    /// - [`MigrateError::Pool`] when the worker pool cannot be built.
    pub fn run(
        &self,
        targets: &[MigrationTarget],
        config: &BatchConfig,
        host: &dyn HostEnvironment,
    ) -> Result<BatchReport, MigrateError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let eligible: Vec<&MigrationTarget> = targets
            .iter()
            .filter(|target| config.kind.matches(&target.path))
            .collect();

        if eligible.is_empty() {
            let report = BatchReport::nothing_to_do(config.kind);
            host.report_final_status(&report.summary());
            return Ok(report);
        }

        let total = eligible.len();
        let threads = config.thread_count();
        info!(total, threads, kind = ?config.kind, "Starting migration batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pkgref-worker-{i}"))
            .build()?;

        let completed = AtomicUsize::new(0);
        let outcomes: Vec<MigrationOutcome> = pool.install(|| {
            eligible
                .par_iter()
                .map(|&target| {
                    let result = match config.kind {
                        MigrationKind::PackageReference => migrate_package_target(target, host),
                        MigrationKind::BindingRedirect => merge_redirect_target(target, host),
                    };

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    match &result {
                        Ok(summary) => {
                            debug!(path = %target.path, "Migrated");
                            host.log(&format!("{}: {summary}", target.path));
                        }
                        Err(error) => {
                            warn!(path = %target.path, %error, "Migration failed");
                            host.log(&format!("{}: FAILED: {error}", target.path));
                        }
                    }
                    host.report_progress(done, total, target.file_name().unwrap_or("file"));

                    MigrationOutcome {
                        target: (*target).clone(),
                        result,
                    }
                })
                .collect()
        });

        let report = BatchReport::from_outcomes(config.kind, outcomes);
        host.report_final_status(&report.summary());
        Ok(report)
    }
}

/// Holds the orchestrator's busy flag for the duration of a run.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, MigrateError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(MigrateError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Migrates one manifest: rewrite the owning project, delete the manifest.
fn migrate_package_target(
    target: &MigrationTarget,
    host: &dyn HostEnvironment,
) -> Result<String, MigrateError> {
    let project_path = target
        .project_path
        .clone()
        .or_else(|| host.owning_project_path(&target.path))
        .ok_or_else(|| MigrateError::missing_project(&target.path))?;

    let _manifest_backup = BackupGuard::create(&target.path)?;
    let _project_backup = BackupGuard::create(&project_path)?;

    let manifest =
        XmlDocument::load(&target.path).map_err(|e| MigrateError::xml(&target.path, e))?;
    let mut project =
        XmlDocument::load(&project_path).map_err(|e| MigrateError::xml(&project_path, e))?;

    let migration = migrate_references(&mut project, &manifest, &target.path)?;

    host.ensure_editable(&project_path)?;
    project
        .save(&project_path)
        .map_err(|e| MigrateError::xml(&project_path, e))?;

    let mut summary = migration.summary();
    if migration.manifest_delete_safe {
        host.ensure_editable(&target.path)?;
        fs::remove_file(target.path.as_std_path())
            .map_err(|e| MigrateError::io(&target.path, e))?;
    } else {
        summary.push_str("; manifest retained, restore checks still report errors");
    }

    Ok(summary)
}

/// Consolidates one configuration file's binding redirects in place.
fn merge_redirect_target(
    target: &MigrationTarget,
    host: &dyn HostEnvironment,
) -> Result<String, MigrateError> {
    let _backup = BackupGuard::create(&target.path)?;

    let mut config =
        XmlDocument::load(&target.path).map_err(|e| MigrateError::xml(&target.path, e))?;
    let merge = merge_redirects(&mut config, &target.path)?;

    host.ensure_editable(&target.path)?;
    config
        .save(&target.path)
        .map_err(|e| MigrateError::xml(&target.path, e))?;

    Ok(merge.summary())
}
