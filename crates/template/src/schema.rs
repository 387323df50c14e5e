//! Fill configuration schema types

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Largest font size tried for title text
pub const DEFAULT_TITLE_MAX_FONT_SIZE: u32 = 36;

/// Largest font size tried for body text and lists
pub const DEFAULT_MAX_FONT_SIZE: u32 = 24;

/// Smallest font size the solver goes down to
pub const DEFAULT_MIN_FONT_SIZE: u32 = 6;

fn default_output() -> PathBuf {
    PathBuf::from("output.pptx")
}

fn default_true() -> bool {
    true
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FillConfig {
    /// Template deck to read
    pub template_pptx: PathBuf,

    /// Where the filled deck is written
    #[serde(default = "default_output")]
    pub output_pptx: PathBuf,

    /// Directory of font files used for measuring; without it text is
    /// left to the presentation application's shrink-on-overflow
    #[serde(default)]
    pub font_dir: Option<PathBuf>,

    /// Scan subdirectories of `font_dir`
    #[serde(default = "default_true")]
    pub font_dir_recursive: bool,

    /// Zero-based slide to fill
    #[serde(default)]
    pub slide_index: usize,

    /// Placeholders in the order they are filled
    pub placeholders: Placeholders,
}

/// Placeholder descriptors keyed by name, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders(Vec<(String, Placeholder)>);

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placeholder; an existing key is replaced in place
    pub fn insert(&mut self, key: impl Into<String>, placeholder: Placeholder) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = placeholder,
            None => self.0.push((key, placeholder)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Placeholder> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placeholder)> {
        self.0.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Placeholders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, placeholder) in &self.0 {
            map.serialize_entry(key, placeholder)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Placeholders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlaceholdersVisitor;

        impl<'de> Visitor<'de> for PlaceholdersVisitor {
            type Value = Placeholders;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of placeholder descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Placeholder)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, placeholder)) = access.next_entry::<String, Placeholder>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate placeholder key '{key}'"
                        )));
                    }
                    entries.push((key, placeholder));
                }
                Ok(Placeholders(entries))
            }
        }

        deserializer.deserialize_map(PlaceholdersVisitor)
    }
}

/// One placeholder descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Placeholder {
    /// Single-paragraph text
    Text(TextPlaceholder),
    /// Picture replacing the shape
    Image(ImagePlaceholder),
    /// One paragraph per item, with a bold label before the first colon
    List(ListPlaceholder),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextPlaceholder {
    /// Shape name on the slide
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_title: bool,
    #[serde(default)]
    pub max_font_size: Option<u32>,
    #[serde(default)]
    pub min_font_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlaceholder {
    pub name: String,
    /// Path of the image file
    pub value: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListPlaceholder {
    pub name: String,
    pub value: Vec<String>,
    #[serde(default)]
    pub max_font_size: Option<u32>,
    #[serde(default)]
    pub min_font_size: Option<u32>,
}

impl Placeholder {
    /// Shape name this placeholder targets
    pub fn name(&self) -> &str {
        match self {
            Placeholder::Text(p) => &p.name,
            Placeholder::Image(p) => &p.name,
            Placeholder::List(p) => &p.name,
        }
    }

    /// The `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Placeholder::Text(_) => "text",
            Placeholder::Image(_) => "image",
            Placeholder::List(_) => "list",
        }
    }

    /// Font size range `(max, min)` after defaults, `None` for images
    pub fn font_size_range(&self) -> Option<(u32, u32)> {
        match self {
            Placeholder::Text(p) => {
                let default_max = if p.is_title {
                    DEFAULT_TITLE_MAX_FONT_SIZE
                } else {
                    DEFAULT_MAX_FONT_SIZE
                };
                Some((
                    p.max_font_size.unwrap_or(default_max),
                    p.min_font_size.unwrap_or(DEFAULT_MIN_FONT_SIZE),
                ))
            }
            Placeholder::List(p) => Some((
                p.max_font_size.unwrap_or(DEFAULT_MAX_FONT_SIZE),
                p.min_font_size.unwrap_or(DEFAULT_MIN_FONT_SIZE),
            )),
            Placeholder::Image(_) => None,
        }
    }

    /// Explicitly configured `(max, min)` sizes
    pub(crate) fn explicit_font_sizes(&self) -> (Option<u32>, Option<u32>) {
        match self {
            Placeholder::Text(p) => (p.max_font_size, p.min_font_size),
            Placeholder::List(p) => (p.max_font_size, p.min_font_size),
            Placeholder::Image(_) => (None, None),
        }
    }
}
