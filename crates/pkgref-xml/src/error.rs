//! Error types for the pkgref-xml crate.
//!
//! This module provides the [`XmlError`] type for failures while loading,
//! querying, mutating, or saving an XML document.

use camino::Utf8PathBuf;

/// Errors that can occur while working with an [`XmlDocument`].
///
/// Parse-level variants carry no path; callers that know the originating
/// file wrap them with path context. I/O variants carry the path directly.
///
/// [`XmlDocument`]: crate::XmlDocument
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Failed to read or write a file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The path that couldn't be accessed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("malformed XML attribute: {0}")]
    Attr(quick_xml::events::attributes::AttrError),

    /// The document contained no root element.
    #[error("document has no root element")]
    NoRootElement,

    /// A required attribute was absent.
    ///
    /// Raised by [`XmlDocument::require_attribute`](crate::XmlDocument::require_attribute);
    /// required attributes never fall through to a missing-value panic.
    #[error("element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// The local name of the element.
        element: String,
        /// The name of the missing attribute.
        attribute: String,
    },

    /// A required element was absent.
    #[error("document is missing required element <{name}>")]
    MissingElement {
        /// The local name of the missing element.
        name: String,
    },

    /// Serializing the tree failed.
    #[error("failed to serialize XML: {0}")]
    Serialize(std::io::Error),
}

impl XmlError {
    /// Creates a new [`XmlError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`XmlError::MissingAttribute`] error.
    #[inline]
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a new [`XmlError::MissingElement`] error.
    #[inline]
    pub fn missing_element(name: impl Into<String>) -> Self {
        Self::MissingElement { name: name.into() }
    }
}
