//! Batch migration engine for legacy dependency-declaration artifacts.
//!
//! This crate is the core of the pkgref-migration tool. It runs destructive,
//! backup-guarded XML transformations over a batch of files with bounded
//! parallelism and aggregates per-file results into one report.
//!
//! # Overview
//!
//! The main entry point is [`BatchOrchestrator`], which combines:
//!
//! - [`BackupGuard`]: `.bak` sibling copies before any mutation
//! - [`migrate_references`]: `packages.config` -> `PackageReference` rewrite
//! - [`merge_redirects`]: duplicate binding-redirect consolidation
//! - [`HostEnvironment`]: the host's checkout/progress/log surface
//!
//! # Architecture
//!
//! ```text
//! BatchOrchestrator (filename filter + rayon pool + busy flag)
//!     │
//!     ├── per target: BackupGuard (copy to .bak, verify)
//!     │       │
//!     │       ├── XmlDocument (pkgref-xml, one tree per worker)
//!     │       ├── migrate_references / merge_redirects
//!     │       └── HostEnvironment::ensure_editable + save + delete
//!     │
//!     └── MigrationOutcome per file -> BatchReport
//! ```
//!
//! # Failure isolation
//!
//! Every per-file error (I/O, malformed XML, missing attribute, denied
//! checkout) is captured in that file's [`MigrationOutcome`]; one bad file
//! never aborts the batch. The batch is successful only when every eligible
//! file succeeded.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod backup;
mod batch;
mod error;
mod host;
mod redirects;
mod refs;
mod report;

pub use backup::BackupGuard;
pub use batch::{BatchConfig, BatchOrchestrator};
pub use error::MigrateError;
pub use host::HostEnvironment;
pub use redirects::{RedirectMerge, merge_redirects};
pub use refs::{ReferenceMigration, migrate_references};
pub use report::{BatchReport, BatchStatus, MigrationOutcome};
