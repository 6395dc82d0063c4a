//! Error types for the pkgref-engine crate.
//!
//! This module provides the [`MigrateError`] type for everything that can go
//! wrong while migrating a batch of files.

use camino::{Utf8Path, Utf8PathBuf};
use pkgref_core::VersionError;
use pkgref_xml::XmlError;

/// Errors that can occur during a migration batch.
///
/// # Error Recovery Strategy
///
/// - Per-file errors ([`Io`](Self::Io), [`Backup`](Self::Backup),
///   [`Xml`](Self::Xml), [`Version`](Self::Version),
///   [`MissingProject`](Self::MissingProject),
///   [`Checkout`](Self::Checkout)) are scoped to that file's outcome and
///   never abort sibling workers.
/// - Batch-level errors ([`Busy`](Self::Busy), [`Pool`](Self::Pool)) abort
///   the run before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Failed to read, write, or delete a file.
    #[error("I/O failure on {path}: {source}")]
    Io {
        /// The path the operation failed on.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or verify a `.bak` backup copy.
    ///
    /// The original file is guaranteed untouched when this is raised.
    #[error("failed to back up {path}: {source}")]
    Backup {
        /// The file that could not be backed up.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file's XML was malformed or missing required structure.
    #[error("malformed data in {path}: {source}")]
    Xml {
        /// The file with malformed content.
        path: Utf8PathBuf,
        /// The underlying XML error.
        #[source]
        source: XmlError,
    },

    /// A version string in the file could not be parsed.
    #[error("malformed version in {path}: {source}")]
    Version {
        /// The file the version came from.
        path: Utf8PathBuf,
        /// The underlying version parse error.
        #[source]
        source: VersionError,
    },

    /// A manifest file has no resolvable owning project.
    #[error("no owning project found for {path}")]
    MissingProject {
        /// The manifest file without a project.
        path: Utf8PathBuf,
    },

    /// The host refused to make a file editable (source-control checkout).
    #[error("checkout of {path} denied: {reason}")]
    Checkout {
        /// The file that could not be checked out.
        path: Utf8PathBuf,
        /// Host-supplied refusal reason.
        reason: String,
    },

    /// Another batch is already running against this orchestrator.
    #[error("a migration batch is already in progress")]
    Busy,

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl MigrateError {
    /// Creates a new [`MigrateError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::Backup`] error.
    #[inline]
    pub fn backup(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Backup {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::Xml`] error.
    #[inline]
    pub fn xml(path: impl Into<Utf8PathBuf>, source: XmlError) -> Self {
        Self::Xml {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::Version`] error.
    #[inline]
    pub fn version(path: impl Into<Utf8PathBuf>, source: VersionError) -> Self {
        Self::Version {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::Checkout`] error.
    #[inline]
    pub fn checkout(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::Checkout {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`MigrateError::MissingProject`] error.
    #[inline]
    pub fn missing_project(path: impl Into<Utf8PathBuf>) -> Self {
        Self::MissingProject { path: path.into() }
    }

    /// Returns `true` if this error is scoped to a single file.
    ///
    /// Recoverable errors land in that file's outcome; the batch continues.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Busy | Self::Pool(_))
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Io { path, .. }
            | Self::Backup { path, .. }
            | Self::Xml { path, .. }
            | Self::Version { path, .. }
            | Self::MissingProject { path }
            | Self::Checkout { path, .. } => Some(path),
            Self::Busy | Self::Pool(_) => None,
        }
    }
}
