//! Mutable XML element tree for the pkgref-migration tool.
//!
//! This crate is the XML adapter the transformation engine works against.
//! A file is loaded into an arena-backed element tree ([`XmlDocument`]),
//! mutated in place through [`NodeId`] handles, and serialized back to disk
//! in one pass.
//!
//! # Design
//!
//! Queries that feed removals ([`XmlDocument::descendant_elements`],
//! [`XmlDocument::descendants_named`]) return materialized `Vec<NodeId>`
//! lists, never live iterators, so removing matched nodes can never
//! invalidate an in-flight traversal.
//!
//! Namespace handling is deliberately light: elements keep their qualified
//! name as written, and lookups match on the local part. That is all the
//! project/config formats need, and it keeps namespace declarations intact
//! on round-trip.
//!
//! # Examples
//!
//! ```
//! use pkgref_xml::XmlDocument;
//!
//! let mut doc = XmlDocument::parse(r#"<root a="1"><child/></root>"#)?;
//! let root = doc.root();
//! assert_eq!(doc.attribute(root, "a"), Some("1"));
//!
//! let extra = doc.create_element("extra");
//! doc.append_child(root, extra);
//! assert!(doc.to_xml_string()?.contains("<extra/>"));
//! # Ok::<(), pkgref_xml::XmlError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod document;
mod error;

pub use document::{NodeId, XmlDocument};
pub use error::XmlError;
