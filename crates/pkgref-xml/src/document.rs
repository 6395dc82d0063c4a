//! Arena-backed mutable XML document.
//!
//! [`XmlDocument`] owns every node in a flat arena and hands out [`NodeId`]
//! handles. Handles stay valid across mutations; detached subtrees simply
//! stop being reachable from the root and are skipped at serialization.

use std::fs;

use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::XmlError;

/// Handle to a node inside an [`XmlDocument`] arena.
///
/// Only valid for the document that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The XML declaration of a parsed document, kept for round-tripping.
#[derive(Debug, Clone)]
struct XmlDecl {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// Node payload: an element with attributes, or character data.
#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        /// Qualified name as written in the source (prefix preserved).
        name: String,
        /// Attributes in document order, `(qualified-name, value)`.
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory XML tree that supports structural queries and mutation.
///
/// Loaded fresh per file, mutated in place by exactly one worker, and
/// serialized back in a single pass. Whitespace-only text is dropped at
/// parse time and the output is re-indented on save.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
    decl: Option<XmlDecl>,
}

impl XmlDocument {
    /// Parses a document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Parse`] for malformed XML and
    /// [`XmlError::NoRootElement`] when the input holds no element at all.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut decl: Option<XmlDecl> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let id = push_element(&mut nodes, &start, stack.last().copied())?;
                    if root.is_none() && stack.is_empty() {
                        root = Some(id);
                    }
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = push_element(&mut nodes, &start, stack.last().copied())?;
                    if root.is_none() && stack.is_empty() {
                        root = Some(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(&parent) = stack.last() {
                        let content = text.unescape()?.into_owned();
                        push_node(&mut nodes, NodeKind::Text(content), Some(parent));
                    }
                }
                Event::CData(cdata) => {
                    if let Some(&parent) = stack.last() {
                        let content = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                        push_node(&mut nodes, NodeKind::Text(content), Some(parent));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(&parent) = stack.last() {
                        let content = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                        push_node(&mut nodes, NodeKind::Comment(content), Some(parent));
                    }
                }
                Event::Decl(d) => {
                    let version = d
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).into_owned())
                        .unwrap_or_else(|_| "1.0".to_owned());
                    let encoding = d
                        .encoding()
                        .and_then(Result::ok)
                        .map(|v| String::from_utf8_lossy(&v).into_owned());
                    let standalone = d
                        .standalone()
                        .and_then(Result::ok)
                        .map(|v| String::from_utf8_lossy(&v).into_owned());
                    decl = Some(XmlDecl {
                        version,
                        encoding,
                        standalone,
                    });
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        let root = root.ok_or(XmlError::NoRootElement)?;
        Ok(Self { nodes, root, decl })
    }

    /// Loads a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the file cannot be read, plus any error
    /// from [`parse`](Self::parse).
    pub fn load(path: &Utf8Path) -> Result<Self, XmlError> {
        let text = fs::read_to_string(path.as_std_path()).map_err(|e| XmlError::io(path, e))?;
        Self::parse(&text)
    }

    /// Serializes the tree and writes it to `path`, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Serialize`] if event writing fails and
    /// [`XmlError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Utf8Path) -> Result<(), XmlError> {
        let text = self.to_xml_string()?;
        fs::write(path.as_std_path(), text).map_err(|e| XmlError::io(path, e))
    }

    /// Serializes the tree to a string with two-space indentation.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        if let Some(decl) = &self.decl {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(XmlError::Serialize)?;
        }
        self.write_node(&mut writer, self.root)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Returns the root element.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` refers to an element node.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Returns the qualified name of an element, or `""` for non-elements.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => name,
            NodeKind::Text(_) | NodeKind::Comment(_) => "",
        }
    }

    /// Returns the local (prefix-stripped) name of an element.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> &str {
        local_part(self.name(id))
    }

    /// Returns the value of an attribute, matched by qualified name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) | NodeKind::Comment(_) => None,
        }
    }

    /// Returns the value of a required attribute.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingAttribute`] when the attribute is absent,
    /// rather than deferring the failure to a later unwrap.
    pub fn require_attribute(&self, id: NodeId, name: &str) -> Result<&str, XmlError> {
        let element = self.local_name(id).to_owned();
        self.attribute(id, name)
            .ok_or_else(|| XmlError::missing_attribute(element, name))
    }

    /// Returns all attributes of an element in document order.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text(_) | NodeKind::Comment(_) => &[],
        }
    }

    /// Sets an attribute, replacing an existing value or appending a new one.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            if let Some(pair) = attributes.iter_mut().find(|(key, _)| key == name) {
                pair.1 = value.to_owned();
            } else {
                attributes.push((name.to_owned(), value.to_owned()));
            }
        }
    }

    /// Returns the element children of a node, in document order.
    #[must_use]
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    /// Returns every descendant element of `id` in document order.
    ///
    /// The list is materialized up front; removing matched nodes while
    /// walking the result is safe.
    #[must_use]
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();

        while let Some(node) = pending.pop() {
            if self.is_element(node) {
                result.push(node);
            }
            pending.extend(self.nodes[node.0].children.iter().rev().copied());
        }

        result
    }

    /// Returns every descendant element whose local name equals `local`.
    #[must_use]
    pub fn descendants_named(&self, id: NodeId, local: &str) -> Vec<NodeId> {
        self.descendant_elements(id)
            .into_iter()
            .filter(|&node| self.local_name(node) == local)
            .collect()
    }

    /// Returns the first descendant element with the given local name.
    #[must_use]
    pub fn first_descendant_named(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.descendant_elements(id)
            .into_iter()
            .find(|&node| self.local_name(node) == local)
    }

    /// Returns `true` if any descendant text node of `id` contains `needle`.
    #[must_use]
    pub fn descendant_text_contains(&self, id: NodeId, needle: &str) -> bool {
        let mut pending: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();

        while let Some(node) = pending.pop() {
            if let NodeKind::Text(text) = &self.nodes[node.0].kind {
                if text.contains(needle) {
                    return true;
                }
            }
            pending.extend(self.nodes[node.0].children.iter().rev().copied());
        }

        false
    }

    /// Creates a new detached element with the given qualified name.
    #[must_use]
    pub fn create_element(&mut self, name: &str) -> NodeId {
        push_node(
            &mut self.nodes,
            NodeKind::Element {
                name: name.to_owned(),
                attributes: Vec::new(),
            },
            None,
        )
    }

    /// Creates a new detached text node.
    #[must_use]
    pub fn create_text(&mut self, text: &str) -> NodeId {
        push_node(&mut self.nodes, NodeKind::Text(text.to_owned()), None)
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// A child that is currently attached elsewhere is detached first, so a
    /// node can be reparented with a single call.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Inserts `new` immediately before `anchor` under the anchor's parent.
    ///
    /// Returns `false` when the anchor has no parent (root or detached).
    pub fn insert_before(&mut self, anchor: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.nodes[anchor.0].parent else {
            return false;
        };
        self.detach(new);

        let Some(position) = self.nodes[parent.0]
            .children
            .iter()
            .position(|&child| child == anchor)
        else {
            return false;
        };

        self.nodes[parent.0].children.insert(position, new);
        self.nodes[new.0].parent = Some(parent);
        true
    }

    /// Detaches a node (and its subtree) from its parent.
    ///
    /// Detaching an already-detached node is a no-op. The subtree stays
    /// addressable through its `NodeId`s but no longer serializes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    fn write_node<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        id: NodeId,
    ) -> Result<(), XmlError> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }

                let children = &self.nodes[id.0].children;
                if children.is_empty() {
                    writer
                        .write_event(Event::Empty(start))
                        .map_err(XmlError::Serialize)?;
                } else {
                    writer
                        .write_event(Event::Start(start))
                        .map_err(XmlError::Serialize)?;
                    for &child in children {
                        self.write_node(writer, child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(XmlError::Serialize)?;
                }
            }
            NodeKind::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(XmlError::Serialize)?;
            }
            NodeKind::Comment(text) => {
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(XmlError::Serialize)?;
            }
        }
        Ok(())
    }
}

/// Appends a node to the arena, wiring the parent link both ways.
fn push_node(nodes: &mut Vec<Node>, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        kind,
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent.0].children.push(id);
    }
    id
}

/// Builds an element node from a start tag.
fn push_element(
    nodes: &mut Vec<Node>,
    start: &BytesStart<'_>,
    parent: Option<NodeId>,
) -> Result<NodeId, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(XmlError::Attr)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(push_node(
        nodes,
        NodeKind::Element { name, attributes },
        parent,
    ))
}

/// Strips a namespace prefix from a qualified name.
fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
