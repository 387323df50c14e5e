//! Font discovery and loading
//!
//! A [`FontCatalog`] indexes every font file in a directory by the family,
//! subfamily and full names stored in the font's own `name` table. File names
//! are only consulted by [`FontCatalog::find_by_file_name`], a separate
//! heuristic for callers that want it.

use crate::{PptxError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use ttf_parser::{name_id, Face};

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Windows "English - United States" language id
const LANG_EN_US: u16 = 0x0409;

/// Font style variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Regular,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }
}

/// How deep to scan a font directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDepth {
    /// Only files directly inside the directory
    TopLevel,
    /// The directory and all its subdirectories
    #[default]
    Recursive,
}

/// A single face inside a font file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFile {
    pub path: PathBuf,
    /// Face index inside a collection (0 for plain TTF/OTF)
    pub face_index: u32,
    pub family: String,
    pub subfamily: String,
    pub full_name: Option<String>,
    pub style: FontStyle,
}

/// Font family with variants
#[derive(Debug, Clone, Default)]
pub struct FontFamily {
    pub regular: Option<FontFile>,
    pub bold: Option<FontFile>,
    pub italic: Option<FontFile>,
    pub bold_italic: Option<FontFile>,
}

impl FontFamily {
    /// Get the exact variant for a style
    pub fn variant(&self, style: FontStyle) -> Option<&FontFile> {
        match style {
            FontStyle::Regular => self.regular.as_ref(),
            FontStyle::Bold => self.bold.as_ref(),
            FontStyle::Italic => self.italic.as_ref(),
            FontStyle::BoldItalic => self.bold_italic.as_ref(),
        }
    }

    /// Get the variant for a style, falling back to regular, then to any style
    pub fn get_variant(&self, style: FontStyle) -> Option<&FontFile> {
        self.variant(style)
            .or(self.regular.as_ref())
            .or(self.bold.as_ref())
            .or(self.italic.as_ref())
            .or(self.bold_italic.as_ref())
    }

    fn slot_mut(&mut self, style: FontStyle) -> &mut Option<FontFile> {
        match style {
            FontStyle::Regular => &mut self.regular,
            FontStyle::Bold => &mut self.bold,
            FontStyle::Italic => &mut self.italic,
            FontStyle::BoldItalic => &mut self.bold_italic,
        }
    }
}

/// Catalog of installed fonts keyed by embedded family name
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    root: PathBuf,
    families: BTreeMap<String, FontFamily>,
    full_names: BTreeMap<String, FontFile>,
    by_path: BTreeMap<PathBuf, Vec<FontFile>>,
    skipped: usize,
}

impl FontCatalog {
    /// Scan a directory and index every parseable font face
    ///
    /// Unreadable or unparseable files are skipped with a warning. A missing
    /// or unreadable directory is an error.
    pub fn build(dir: impl AsRef<Path>, depth: ScanDepth) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(PptxError::FontDirectory {
                path: root,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut paths = Vec::new();
        collect_font_paths(&root, depth, &mut paths)?;
        paths.sort();

        let mut catalog = Self {
            root,
            ..Default::default()
        };

        for path in paths {
            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!("skipping unreadable font {}: {err}", path.display());
                    catalog.skipped += 1;
                    continue;
                }
            };
            match parse_font_faces(&path, &data) {
                Ok(faces) if !faces.is_empty() => {
                    for face in faces {
                        catalog.insert(face);
                    }
                }
                Ok(_) => {
                    tracing::warn!("skipping font without names: {}", path.display());
                    catalog.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!("skipping font: {err}");
                    catalog.skipped += 1;
                }
            }
        }

        tracing::info!(
            "indexed {} font families from {} ({} files skipped)",
            catalog.families.len(),
            catalog.root.display(),
            catalog.skipped
        );
        Ok(catalog)
    }

    fn insert(&mut self, face: FontFile) {
        if let Some(full) = &face.full_name {
            self.full_names
                .entry(full.clone())
                .or_insert_with(|| face.clone());
        }
        self.by_path
            .entry(face.path.clone())
            .or_default()
            .push(face.clone());

        let family = self.families.entry(face.family.clone()).or_default();
        let slot = family.slot_mut(face.style);
        if let Some(existing) = slot {
            tracing::debug!(
                "duplicate {:?} face for '{}': keeping {}, ignoring {}",
                face.style,
                face.family,
                existing.path.display(),
                face.path.display()
            );
        } else {
            *slot = Some(face);
        }
    }

    /// Directory this catalog was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of font files that could not be indexed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Indexed family names, sorted
    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    pub fn family(&self, name: &str) -> Option<&FontFamily> {
        self.families.get(name)
    }

    /// Look up a face by name and style
    ///
    /// Tries the exact family/style, then the family's regular face, then any
    /// face of the family, then a face whose full name equals `name`.
    /// Matching is case-sensitive.
    pub fn lookup(&self, name: &str, style: FontStyle) -> Result<&FontFile> {
        self.families
            .get(name)
            .and_then(|family| family.get_variant(style))
            .or_else(|| self.full_names.get(name))
            .ok_or_else(|| PptxError::FontNotFound(format!("{name} ({style:?})")))
    }

    /// Match a font name against file names (spaces and dashes ignored)
    ///
    /// Returns the first face of the first file whose normalized stem
    /// contains the normalized name or is contained in it.
    pub fn find_by_file_name(&self, name: &str) -> Option<&FontFile> {
        let wanted = normalize_for_file_match(name);
        if wanted.is_empty() {
            return None;
        }
        self.by_path.iter().find_map(|(path, faces)| {
            let stem = path.file_stem()?.to_str()?;
            let stem = normalize_for_file_match(stem);
            if stem.is_empty() {
                return None;
            }
            if stem.contains(&wanted) || wanted.contains(&stem) {
                faces.first()
            } else {
                None
            }
        })
    }

    /// Read a face's font file into memory
    pub fn load(&self, file: &FontFile) -> Result<LoadedFont> {
        let data = fs::read(&file.path)?;
        let loaded = LoadedFont {
            file: file.clone(),
            data,
        };
        // Validate once so measurers can rely on a parseable face
        loaded.face()?;
        Ok(loaded)
    }
}

fn normalize_for_file_match(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn collect_font_paths(dir: &Path, depth: ScanDepth, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| PptxError::FontDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PptxError::FontDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            if depth == ScanDepth::Recursive {
                if let Err(err) = collect_font_paths(&path, depth, out) {
                    tracing::warn!("skipping font subdirectory: {err}");
                }
            }
            continue;
        }
        if has_font_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse every face in a font file (collections yield several)
fn parse_font_faces(path: &Path, data: &[u8]) -> Result<Vec<FontFile>> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    let mut faces = Vec::new();

    for index in 0..count {
        let face = Face::parse(data, index)
            .map_err(|e| PptxError::FontParseError(format!("{}: {e}", path.display())))?;

        let family = name_string(&face, name_id::FAMILY);
        let full_name = name_string(&face, name_id::FULL_NAME);
        let subfamily = name_string(&face, name_id::SUBFAMILY).unwrap_or_default();

        let Some(family) = family.or_else(|| full_name.clone()) else {
            continue;
        };

        let sub = subfamily.to_lowercase();
        let bold = face.is_bold() || sub.contains("bold");
        let italic = face.is_italic() || sub.contains("italic") || sub.contains("oblique");

        faces.push(FontFile {
            path: path.to_path_buf(),
            face_index: index,
            family,
            subfamily,
            full_name,
            style: FontStyle::from_flags(bold, italic),
        });
    }

    Ok(faces)
}

/// Read a name record, preferring Windows US-English entries
fn name_string(face: &Face<'_>, id: u16) -> Option<String> {
    let names: Vec<_> = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == id)
        .collect();

    names
        .iter()
        .filter(|name| name.language_id == LANG_EN_US)
        .chain(names.iter())
        .find_map(|name| name.to_string())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Font file bytes held in memory
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub file: FontFile,
    pub data: Vec<u8>,
}

impl LoadedFont {
    /// Parse the face out of the loaded bytes
    pub fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, self.file.face_index).map_err(|e| {
            PptxError::FontParseError(format!("{}: {e}", self.file.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_font;
    use pretty_assertions::assert_eq;

    fn write_font(dir: &Path, file: &str, family: &str, subfamily: &str) {
        fs::write(dir.join(file), synthetic_font(family, subfamily)).unwrap();
    }

    #[test]
    fn test_font_style_from_flags() {
        assert_eq!(FontStyle::from_flags(false, false), FontStyle::Regular);
        assert_eq!(FontStyle::from_flags(true, false), FontStyle::Bold);
        assert_eq!(FontStyle::from_flags(true, true), FontStyle::BoldItalic);
        assert!(FontStyle::BoldItalic.is_bold());
        assert!(!FontStyle::Italic.is_bold());
    }

    #[test]
    fn test_catalog_uses_embedded_names() {
        let dir = tempfile::tempdir().unwrap();
        // File name deliberately unrelated to the family name
        write_font(dir.path(), "xyz-001.ttf", "Test Sans", "Regular");
        write_font(dir.path(), "xyz-002.ttf", "Test Sans", "Bold");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        assert_eq!(catalog.family_names().collect::<Vec<_>>(), vec!["Test Sans"]);

        let regular = catalog.lookup("Test Sans", FontStyle::Regular).unwrap();
        assert!(regular.path.ends_with("xyz-001.ttf"));
        assert_eq!(regular.style, FontStyle::Regular);

        let bold = catalog.lookup("Test Sans", FontStyle::Bold).unwrap();
        assert!(bold.path.ends_with("xyz-002.ttf"));
        assert_eq!(bold.style, FontStyle::Bold);
    }

    #[test]
    fn test_lookup_falls_back_to_regular() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "a.ttf", "Only Regular", "Regular");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        let face = catalog.lookup("Only Regular", FontStyle::Bold).unwrap();
        assert_eq!(face.style, FontStyle::Regular);
    }

    #[test]
    fn test_lookup_by_full_name() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "a.ttf", "Family", "Bold");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        // Synthetic fonts use "<family> <subfamily>" as full name
        let face = catalog.lookup("Family Bold", FontStyle::Regular).unwrap();
        assert_eq!(face.family, "Family");
    }

    #[test]
    fn test_lookup_missing_family() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "a.ttf", "Present", "Regular");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        assert!(matches!(
            catalog.lookup("Absent", FontStyle::Regular),
            Err(PptxError::FontNotFound(_))
        ));
        // Lookup is case-sensitive
        assert!(catalog.lookup("present", FontStyle::Regular).is_err());
    }

    #[test]
    fn test_scan_depth() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        write_font(&nested, "deep.ttf", "Deep", "Regular");

        let shallow = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        assert!(shallow.family("Deep").is_none());

        let deep = FontCatalog::build(dir.path(), ScanDepth::Recursive).unwrap();
        assert!(deep.family("Deep").is_some());
    }

    #[test]
    fn test_invalid_font_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.ttf"), b"not a font").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        write_font(dir.path(), "good.ttf", "Good", "Regular");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        assert_eq!(catalog.skipped(), 1);
        assert!(catalog.family("Good").is_some());
    }

    #[test]
    fn test_missing_directory() {
        let err = FontCatalog::build("/definitely/not/here", ScanDepth::Recursive).unwrap_err();
        assert!(matches!(err, PptxError::FontDirectory { .. }));
    }

    #[test]
    fn test_find_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "Noto-Sans-JP.ttf", "Internal Name", "Regular");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        let face = catalog.find_by_file_name("Noto Sans JP").unwrap();
        assert_eq!(face.family, "Internal Name");
        assert!(catalog.find_by_file_name("Helvetica").is_none());
        assert!(catalog.find_by_file_name("").is_none());
    }

    #[test]
    fn test_load_font() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "a.ttf", "Loadable", "Regular");

        let catalog = FontCatalog::build(dir.path(), ScanDepth::TopLevel).unwrap();
        let file = catalog.lookup("Loadable", FontStyle::Regular).unwrap();
        let loaded = catalog.load(file).unwrap();
        assert_eq!(loaded.face().unwrap().units_per_em(), 1000);
    }
}
