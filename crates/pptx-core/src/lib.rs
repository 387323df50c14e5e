//! PPTX Core - Low-level slide-deck manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PPTX packages (ZIP container of XML parts)
//! - Looking up shapes by name, with frame/inset/font inheritance from layouts
//! - Extracting theme fonts and resolving theme font references
//! - Indexing font files by their embedded family names
//! - Measuring text with real glyph metrics
//! - Replacing shapes with aspect-fitted pictures
//!
//! # Example
//!
//! ```ignore
//! use pptx_core::{PptxDocument, TextParagraph, TextRun, AutoFit};
//!
//! let mut doc = PptxDocument::open("template.pptx")?;
//! let shape = doc.shape(0, "Title")?;
//! let paragraphs = vec![TextParagraph::single(TextRun::plain("Hello").with_size(28))];
//! doc.write_text(0, "Title", &paragraphs, AutoFit::None)?;
//! doc.save("output.pptx")?;
//! ```

mod document;
mod font;
mod image;
mod package;
mod shape;
mod text;
mod theme;
pub mod xml;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use document::PptxDocument;
pub use font::{FontCatalog, FontFamily, FontFile, FontStyle, LoadedFont, ScanDepth};
pub use image::{detect_format, fit_centered, ImageFormat, ImageSource};
pub use package::{Package, Relationship, Relationships};
pub use shape::{
    AutoFit, Frame, Insets, LineSpacing, ParagraphFormat, PlaceholderRef, ShapeInfo, ShapeKind,
    TextParagraph, TextRun, MAX_FONT_SIZE_PT,
};
pub use text::{pt_to_px, TextMeasurer, DPI};
pub use theme::{
    default_family, resolve_font_reference, FontDeclaration, FontReference, ThemeFontClass,
    ThemeFontSet, DEFAULT_EAST_ASIAN_FAMILY, DEFAULT_LATIN_FAMILY,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during PPTX operations
#[derive(Debug, Error)]
pub enum PptxError {
    #[error("Failed to open PPTX: {0}")]
    OpenError(String),

    #[error("Failed to save PPTX: {0}")]
    SaveError(String),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Invalid slide index: {0} (presentation has {1} slides)")]
    InvalidSlide(usize, usize),

    #[error("Shape not found: {0}")]
    ShapeNotFound(String),

    #[error("Shape '{0}' has no text frame")]
    NoTextFrame(String),

    #[error("Shape '{0}' has no position or size")]
    NoFrame(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Cannot read font directory {}: {source}", .path.display())]
    FontDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

/// Result type for PPTX operations
pub type Result<T> = std::result::Result<T, PptxError>;

/// Unit conversions used across DrawingML parts
pub mod units {
    /// English Metric Units per point
    pub const EMU_PER_POINT: i64 = 12_700;

    /// Convert EMU to points
    pub fn emu_to_pt(emu: i64) -> f32 {
        emu as f32 / EMU_PER_POINT as f32
    }

    /// Convert points to EMU (truncating)
    pub fn pt_to_emu(pt: f32) -> i64 {
        (pt * EMU_PER_POINT as f32) as i64
    }
}
