//! Domain types for the pkgref-migration tool.
//!
//! # Module Organization
//!
//! - [`target`] - Migration kinds and the per-file unit of work
//!
//! # Re-exports
//!
//! All public types are re-exported at this module level and at the crate
//! root for convenience:
//!
//! ```
//! use pkgref_core::{MigrationKind, MigrationTarget};
//! ```

mod target;

pub use target::{MigrationKind, MigrationTarget};
