//! Per-file outcomes and the aggregated batch report.

use pkgref_core::{MigrationKind, MigrationTarget};

use crate::error::MigrateError;

/// The result of migrating one file.
#[derive(Debug)]
pub struct MigrationOutcome {
    /// The file this outcome belongs to.
    pub target: MigrationTarget,
    /// A summary line on success, the scoped error on failure.
    pub result: Result<String, MigrateError>,
}

impl MigrationOutcome {
    /// Returns `true` if this file was migrated successfully.
    #[inline]
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Overall disposition of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// No selected file matched the migration kind's filename filter.
    NothingToDo,
    /// Every eligible file migrated successfully.
    AllSucceeded,
    /// Some eligible files migrated, some failed.
    PartialFailure,
    /// Every eligible file failed.
    TotalFailure,
}

/// Aggregated results of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// The migration kind the batch ran.
    pub kind: MigrationKind,
    /// One outcome per eligible file, in input order.
    pub outcomes: Vec<MigrationOutcome>,
    /// The overall disposition.
    pub status: BatchStatus,
}

impl BatchReport {
    /// Builds a report from per-file outcomes, deriving the status.
    #[must_use]
    pub fn from_outcomes(kind: MigrationKind, outcomes: Vec<MigrationOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let status = if outcomes.is_empty() {
            BatchStatus::NothingToDo
        } else if succeeded == outcomes.len() {
            BatchStatus::AllSucceeded
        } else if succeeded == 0 {
            BatchStatus::TotalFailure
        } else {
            BatchStatus::PartialFailure
        };
        Self {
            kind,
            outcomes,
            status,
        }
    }

    /// Builds an empty report for a batch with no eligible files.
    #[must_use]
    pub const fn nothing_to_do(kind: MigrationKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
            status: BatchStatus::NothingToDo,
        }
    }

    /// Returns the number of files that migrated successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Returns the number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Returns `true` when nothing went wrong.
    ///
    /// An empty batch counts as success; there was nothing to fail.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self.status,
            BatchStatus::NothingToDo | BatchStatus::AllSucceeded
        )
    }

    /// Returns the final status line shown to the user.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.status {
            BatchStatus::NothingToDo => {
                format!("No {} files were selected.", self.kind.label())
            }
            BatchStatus::AllSucceeded => format!(
                "Migrated {} {} file(s).",
                self.succeeded(),
                self.kind.label()
            ),
            BatchStatus::PartialFailure => format!(
                "Migrated {} {} file(s); {} failed.",
                self.succeeded(),
                self.kind.label(),
                self.failed()
            ),
            BatchStatus::TotalFailure => format!(
                "All {} {} file(s) failed to migrate.",
                self.failed(),
                self.kind.label()
            ),
        }
    }
}
