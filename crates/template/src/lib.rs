//! Template - placeholder filling for PPTX decks
//!
//! This crate provides:
//! - The JSON fill configuration (`templatePptx`, `placeholders`, ...)
//! - A fit solver finding the largest font size that fits a shape
//! - A filler that writes text, lists and pictures into named shapes
//!
//! # Example
//!
//! ```ignore
//! use template::{fill_presentation, parse_config};
//!
//! let config = parse_config(r#"{
//!     "templatePptx": "template.pptx",
//!     "fontDir": "fonts",
//!     "placeholders": {
//!         "title": { "name": "Title 1", "type": "text", "isTitle": true, "value": "Hello" }
//!     }
//! }"#)?;
//! let filled = fill_presentation(&config)?;
//! ```

mod filler;
pub mod fit;
pub mod parser;
mod schema;

pub use filler::{
    fill_presentation, FillOutcome, FilledPlaceholder, FontContext, ResolvedFont, TemplateFiller,
};
pub use fit::{FitBudget, FitResult, FitSolver, Paragraph, Run};
pub use parser::parse_config;
pub use schema::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a configuration or filling a deck
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid fit budget: {0}")]
    InvalidBudget(String),

    #[error("Placeholder '{key}': shape '{name}' not found")]
    ShapeNotFound { key: String, name: String },

    #[error("{}: {message}", .path.display())]
    ResourceError { path: PathBuf, message: String },

    #[error("PPTX error: {0}")]
    PptxError(#[from] pptx_core::PptxError),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
