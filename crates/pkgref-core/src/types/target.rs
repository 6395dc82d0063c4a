//! Migration kinds and the per-file unit of work.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Manifest file names recognized for reference migration.
const MANIFEST_FILE_NAMES: &[&str] = &["packages.config"];

/// Configuration file names recognized for binding-redirect consolidation.
const REDIRECT_FILE_NAMES: &[&str] = &["app.config", "web.config"];

/// The transformation a batch run applies.
///
/// Each kind recognizes a small fixed set of file names; eligibility is
/// decided purely by the final path segment, compared case-insensitively.
/// No content sniffing happens before the initial load.
///
/// # Examples
///
/// ```
/// use pkgref_core::MigrationKind;
/// use camino::Utf8Path;
///
/// assert!(MigrationKind::PackageReference.matches(Utf8Path::new("src/Packages.Config")));
/// assert!(MigrationKind::BindingRedirect.matches(Utf8Path::new("Web.config")));
/// assert!(!MigrationKind::PackageReference.matches(Utf8Path::new("app.config")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    /// Rewrite `packages.config`-driven references into `PackageReference`
    /// items embedded in the owning project file.
    PackageReference,
    /// Consolidate duplicate binding redirects in an `app.config` or
    /// `web.config` into one version-resolved rule per assembly.
    BindingRedirect,
}

impl MigrationKind {
    /// Returns the file names this kind recognizes.
    #[must_use]
    pub const fn file_names(self) -> &'static [&'static str] {
        match self {
            Self::PackageReference => MANIFEST_FILE_NAMES,
            Self::BindingRedirect => REDIRECT_FILE_NAMES,
        }
    }

    /// Returns `true` if the final segment of `path` names an eligible file.
    #[must_use]
    pub fn matches(self, path: &Utf8Path) -> bool {
        path.file_name().is_some_and(|name| {
            self.file_names()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name))
        })
    }

    /// Returns a short human-readable label for status messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PackageReference => "package reference migration",
            Self::BindingRedirect => "binding redirect consolidation",
        }
    }
}

/// A single file selected for migration.
///
/// The unit of work dispatched to a worker: the file to transform plus, for
/// reference migration, the path of the owning project file. Immutable once
/// selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationTarget {
    /// The file to transform (manifest or configuration file).
    pub path: Utf8PathBuf,
    /// The owning project file, when known at selection time.
    ///
    /// Only meaningful for reference migration; `None` for binding-redirect
    /// targets or when the host resolves the project lazily.
    pub project_path: Option<Utf8PathBuf>,
}

impl MigrationTarget {
    /// Creates a target with no associated project file.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            project_path: None,
        }
    }

    /// Creates a target with an associated owning project file.
    #[must_use]
    pub fn with_project(path: impl Into<Utf8PathBuf>, project: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            project_path: Some(project.into()),
        }
    }

    /// Returns the final path segment of the target file, if any.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_reference_matches_case_insensitive() {
        let kind = MigrationKind::PackageReference;
        assert!(kind.matches(Utf8Path::new("packages.config")));
        assert!(kind.matches(Utf8Path::new("proj/PACKAGES.CONFIG")));
        assert!(kind.matches(Utf8Path::new("a/b/Packages.Config")));
        assert!(!kind.matches(Utf8Path::new("packages.json")));
        assert!(!kind.matches(Utf8Path::new("app.config")));
    }

    #[test]
    fn test_binding_redirect_matches_both_config_names() {
        let kind = MigrationKind::BindingRedirect;
        assert!(kind.matches(Utf8Path::new("app.config")));
        assert!(kind.matches(Utf8Path::new("site/Web.Config")));
        assert!(!kind.matches(Utf8Path::new("packages.config")));
        assert!(!kind.matches(Utf8Path::new("machine.config")));
    }

    #[test]
    fn test_matches_uses_final_segment_only() {
        let kind = MigrationKind::PackageReference;
        // Directory named like the manifest must not make a child eligible.
        assert!(!kind.matches(Utf8Path::new("packages.config/other.txt")));
    }

    #[test]
    fn test_target_constructors() {
        let standalone = MigrationTarget::new("a/app.config");
        assert_eq!(standalone.file_name(), Some("app.config"));
        assert!(standalone.project_path.is_none());

        let with_project = MigrationTarget::with_project("a/packages.config", "a/App.csproj");
        assert_eq!(
            with_project.project_path.as_deref(),
            Some(Utf8Path::new("a/App.csproj"))
        );
    }
}
