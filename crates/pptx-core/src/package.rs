//! OPC package: ZIP container, relationships and content types

use crate::xml::{XmlDocument, XmlElement};
use crate::{PptxError, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URI prefix shared by all office relationships
pub const RELATIONSHIP_TYPE_BASE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

/// Package relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Check the relationship type by its last path segment (`slideLayout`, `image`, ...)
    pub fn is_type(&self, short_type: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(short_type)
    }
}

/// Relationships of one part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    pub entries: Vec<Relationship>,
}

impl Relationships {
    pub fn from_xml(doc: &XmlDocument) -> Self {
        let entries = doc
            .root
            .children_named("Relationship")
            .filter_map(|el| {
                Some(Relationship {
                    id: el.attr("Id")?.to_string(),
                    rel_type: el.attr("Type")?.to_string(),
                    target: el.attr("Target")?.to_string(),
                    external: el.attr("TargetMode") == Some("External"),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn to_xml(&self) -> XmlDocument {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.entries {
            let mut el = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.clone())
                .with_attr("Type", rel.rel_type.clone())
                .with_attr("Target", rel.target.clone());
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        XmlDocument::new(root)
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// First internal relationship of a type
    pub fn first_of_type(&self, short_type: &str) -> Option<&Relationship> {
        self.entries
            .iter()
            .find(|rel| !rel.external && rel.is_type(short_type))
    }

    /// Add a relationship, returning its new id
    pub fn add(&mut self, short_type: &str, target: &str) -> String {
        let next = self
            .entries
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: format!("{RELATIONSHIP_TYPE_BASE}{short_type}"),
            target: target.to_string(),
            external: false,
        });
        id
    }
}

/// Relationships part name for a part (`""` is the package root)
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns it
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// In-memory OPC package
///
/// Parts keep the order they had in the source archive so a saved package
/// lists its entries the same way.
#[derive(Debug, Clone, Default)]
pub struct Package {
    order: Vec<String>,
    parts: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Read a package from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PptxError::OpenError(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| PptxError::OpenError(format!("not a ZIP package: {e}")))?;

        let mut package = Self::default();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)?;
            package.set_part(&name, buf);
        }

        if !package.contains(CONTENT_TYPES_PART) {
            return Err(PptxError::OpenError(format!("missing {CONTENT_TYPES_PART}")));
        }
        Ok(package)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Result<&[u8]> {
        self.parts
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PptxError::MissingPart(name.to_string()))
    }

    pub fn xml_part(&self, name: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.part(name)?)
            .map_err(|e| PptxError::XmlError(format!("{name}: {e}")))
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if self.parts.insert(name.to_string(), data).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn set_xml_part(&mut self, name: &str, doc: &XmlDocument) {
        self.set_part(name, doc.to_bytes());
    }

    /// Relationships of a part (empty when it has no rels part)
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        if !self.contains(&rels_path) {
            return Ok(Relationships::default());
        }
        Ok(Relationships::from_xml(&self.xml_part(&rels_path)?))
    }

    pub fn set_relationships(&mut self, part: &str, rels: &Relationships) {
        self.set_xml_part(&rels_path_for(part), &rels.to_xml());
    }

    /// Resolve the target part of a relationship of `part`
    pub fn related_part(&self, part: &str, short_type: &str) -> Result<Option<String>> {
        Ok(self
            .relationships(part)?
            .first_of_type(short_type)
            .map(|rel| resolve_target(part, &rel.target)))
    }

    /// Register a default content type for an extension if none exists
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let mut types = self.xml_part(CONTENT_TYPES_PART)?;
        let exists = types.root.children_named("Default").any(|el| {
            el.attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if exists {
            return Ok(());
        }

        let default = XmlElement::new("Default")
            .with_attr("Extension", extension)
            .with_attr("ContentType", content_type);
        // Defaults precede overrides
        let index = types
            .root
            .children
            .iter()
            .position(|node| {
                matches!(node, crate::xml::XmlNode::Element(el) if el.name == "Override")
            })
            .unwrap_or(types.root.children.len());
        types.root.insert(index, default);
        self.set_xml_part(CONTENT_TYPES_PART, &types);
        Ok(())
    }

    /// Serialize the package to ZIP bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // The content types part goes first
        let names = std::iter::once(CONTENT_TYPES_PART)
            .chain(self.part_names().filter(|name| *name != CONTENT_TYPES_PART));
        for name in names {
            let data = self.part(name)?;
            zip.start_file(name, options)?;
            zip.write_all(data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the package to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| PptxError::SaveError(format!("{}: {e}", path.display())))
    }
}
