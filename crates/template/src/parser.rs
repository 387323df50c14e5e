//! Configuration parsing and validation

use crate::{FillConfig, Result, TemplateError};
use pptx_core::MAX_FONT_SIZE_PT;
use std::path::Path;

/// Parse and validate a fill configuration from a JSON string
pub fn parse_config(json: &str) -> Result<FillConfig> {
    let config: FillConfig =
        serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

impl FillConfig {
    /// Read and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TemplateError::ResourceError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        parse_config(&json)
    }
}

/// Check values serde cannot express
pub fn validate(config: &FillConfig) -> Result<()> {
    if config.template_pptx.as_os_str().is_empty() {
        return Err(TemplateError::ConfigError(
            "templatePptx must not be empty".to_string(),
        ));
    }

    for (key, placeholder) in config.placeholders.iter() {
        if placeholder.name().trim().is_empty() {
            return Err(TemplateError::ConfigError(format!(
                "placeholder '{key}': name must not be empty"
            )));
        }

        let (max, min) = placeholder.explicit_font_sizes();
        if max == Some(0) {
            return Err(TemplateError::ConfigError(format!(
                "placeholder '{key}': maxFontSize must be positive"
            )));
        }
        if min == Some(0) {
            return Err(TemplateError::ConfigError(format!(
                "placeholder '{key}': minFontSize must be positive"
            )));
        }
        for (field, size) in [("maxFontSize", max), ("minFontSize", min)] {
            if let Some(size) = size.filter(|&size| size > MAX_FONT_SIZE_PT) {
                return Err(TemplateError::ConfigError(format!(
                    "placeholder '{key}': {field} {size} exceeds {MAX_FONT_SIZE_PT}pt"
                )));
            }
        }
        if let Some((max, min)) = placeholder.font_size_range() {
            if min > max {
                return Err(TemplateError::ConfigError(format!(
                    "placeholder '{key}': minFontSize {min} exceeds maxFontSize {max}"
                )));
            }
        }
    }

    Ok(())
}
