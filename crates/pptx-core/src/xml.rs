//! Minimal owned XML tree for package parts
//!
//! Parts are small enough to hold in memory. Element names keep their
//! namespace prefix (`p:sp`, `a:t`) exactly as written in the part, and
//! lookups match on that qualified name.

use crate::{PptxError, Result};
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Declaration written at the top of every serialized part
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// XML node
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text append
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Iterate over child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.name == name)
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Follow a `/`-separated path of child element names
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |current, segment| current.child(segment))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        let mut current = self;
        for segment in path.split('/') {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Element name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit_once(':').map_or(self.name.as_str(), |(_, local)| local)
    }

    /// First child whose local name matches, whatever its prefix
    pub fn child_local(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// Like [`find`](Self::find), matching local names
    pub fn find_local(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |current, segment| current.child_local(segment))
    }

    /// First descendant (depth-first, excluding self) with the given name
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        for el in self.elements() {
            if el.name == name {
                return Some(el);
            }
            if let Some(found) = el.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Get a child element, appending an empty one if missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let pos = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.name == name));
        let pos = match pos {
            Some(pos) => pos,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[pos] {
            XmlNode::Element(el) => el,
            XmlNode::Text(_) => unreachable!("position points at an element"),
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element before the child node at `index`
    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Remove all child elements whose name is in `names`, returning how many were removed
    pub fn remove_children(&mut self, names: &[&str]) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if names.contains(&el.name.as_str())));
        before - self.children.len()
    }

    /// Concatenated text of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.write_to(out),
                XmlNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// A parsed XML part
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse an XML part
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => stack.push(element_from_start(&reader, &e)?),
                Ok(Event::Empty(e)) => {
                    let el = element_from_start(&reader, &e)?;
                    attach(&mut stack, &mut root, el);
                }
                Ok(Event::End(_)) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| PptxError::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, el);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .decode()
                        .map_err(|err| PptxError::XmlError(format!("text decode: {err:?}")))?;
                    push_text(&mut stack, &text);
                }
                Ok(Event::CData(e)) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| PptxError::XmlError(format!("cdata decode: {err:?}")))?;
                    push_text(&mut stack, &text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e
                        .decode()
                        .map_err(|err| PptxError::XmlError(format!("entity decode: {err:?}")))?;
                    let entity = format!("&{name};");
                    let resolved = unescape(&entity)
                        .map_err(|err| PptxError::XmlError(format!("entity {entity}: {err:?}")))?;
                    push_text(&mut stack, &resolved);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(PptxError::XmlError(format!(
                        "at byte {}: {err}",
                        reader.buffer_position()
                    )))
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(PptxError::XmlError("unclosed element".to_string()));
        }
        root.map(Self::new)
            .ok_or_else(|| PptxError::XmlError("document has no root element".to_string()))
    }

    /// Serialize the part, including the standard declaration
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
        self.root.write_to(&mut out);
        out.into_bytes()
    }
}

fn element_from_start(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<XmlElement> {
    let decoder = reader.decoder();
    let name = decoder
        .decode(e.name().as_ref())
        .map_err(|err| PptxError::XmlError(format!("tag name decode: {err:?}")))?
        .into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PptxError::XmlError(format!("attribute: {err}")))?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|err| PptxError::XmlError(format!("attribute key: {err:?}")))?
            .into_owned();
        let raw = decoder
            .decode(&attr.value)
            .map_err(|err| PptxError::XmlError(format!("attribute value: {err:?}")))?;
        let value = unescape(&raw)
            .map_err(|err| PptxError::XmlError(format!("attribute {key}: {err:?}")))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => *root = Some(el),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    // Text outside the root element is insignificant whitespace
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}
