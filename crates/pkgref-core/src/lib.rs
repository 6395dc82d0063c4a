//! Core types, errors, and utilities for the pkgref-migration tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Domain types ([`MigrationKind`], [`MigrationTarget`])
//! - The dotted assembly-version comparator ([`AssemblyVersion`])
//! - Error types for consistent error handling

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
pub mod types;
mod version;

pub use error::VersionError;
pub use types::{MigrationKind, MigrationTarget};
pub use version::AssemblyVersion;
