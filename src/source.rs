//! # Page Sources
//!
//! Reads the raw module list of a page from a JSON or YAML file. A source
//! document is either an array of module records or a page record with a
//! `modules` array; the records themselves are taken as they are and only
//! judged later by the classifier.

use crate::module::RawModule;
use crate::{ModuleFlowError, Result};
use log::debug;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl SourceFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Some(SourceFormat::Json),
            Some("yaml") | Some("yml") => Some(SourceFormat::Yaml),
            _ => None,
        }
    }
}

/// Loads the modules of a page from `path`.
pub fn load_modules(path: &Path) -> Result<Vec<RawModule>> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        ModuleFlowError::source_error(
            format!(
                "Unsupported page source `{}`; expected .json, .yaml or .yml",
                path.display()
            ),
            None,
        )
    })?;
    let text = fs::read_to_string(path)
        .map_err(|e| ModuleFlowError::io_error(path.to_path_buf(), e))?;
    let modules = parse_modules(&text, format)?;
    debug!("Loaded {} modules from {}", modules.len(), path.display());
    Ok(modules)
}

/// Parses a page source document.
pub fn parse_modules(text: &str, format: SourceFormat) -> Result<Vec<RawModule>> {
    let document: JsonValue = match format {
        SourceFormat::Json => serde_json::from_str(text).map_err(|e| {
            ModuleFlowError::source_error(
                "Invalid JSON page source",
                Some(Box::new(e)),
            )
        })?,
        SourceFormat::Yaml => serde_yml::from_str(text).map_err(|e| {
            ModuleFlowError::source_error(
                "Invalid YAML page source",
                Some(Box::new(e)),
            )
        })?,
    };

    RawModule::list_from_value(document).ok_or_else(|| {
        ModuleFlowError::source_error(
            "Page source must be a list of modules or an object with a `modules` list",
            None,
        )
    })
}
