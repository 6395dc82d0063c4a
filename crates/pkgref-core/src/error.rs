//! Error types for the pkgref-core crate.
//!
//! This module provides the [`VersionError`] type for failures while parsing
//! dotted assembly version strings.

/// Errors that can occur while parsing an assembly version string.
///
/// A version string is a sequence of dot-separated non-negative integer
/// components, e.g. `1.2.0.0`. Anything else is a data error for the file
/// the version came from.
///
/// # Examples
///
/// ```
/// use pkgref_core::AssemblyVersion;
///
/// let err = "1.beta.0".parse::<AssemblyVersion>().unwrap_err();
/// assert!(err.to_string().contains("beta"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The version string was empty.
    #[error("version string is empty")]
    Empty,

    /// A dot-separated component was not a non-negative integer.
    #[error("invalid version component '{component}' in '{version}'")]
    InvalidComponent {
        /// The offending component.
        component: String,
        /// The full version string being parsed.
        version: String,
    },
}

impl VersionError {
    /// Creates a new [`VersionError::InvalidComponent`] error.
    #[inline]
    pub fn invalid_component(component: impl Into<String>, version: impl Into<String>) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_display() {
        assert_eq!(VersionError::Empty.to_string(), "version string is empty");
    }

    #[test]
    fn test_invalid_component_display() {
        let err = VersionError::invalid_component("x1", "1.x1.0");
        let msg = err.to_string();
        assert!(msg.contains("x1"));
        assert!(msg.contains("1.x1.0"));
    }
}
