//! # Error Handling for ModuleFlow
//!
//! This module defines the error types surfaced by the ModuleFlow library.
//! The `thiserror` crate is used to keep error creation and display
//! consistent across configuration, page source loading, template
//! registration and output generation.
//!
//! The render path itself never produces these errors: a module that cannot
//! be classified or rendered is skipped, and the rest of the page renders.

use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the ModuleFlow library.
///
/// This type alias simplifies function signatures by defining a result type that always uses `ModuleFlowError` as the error variant.
pub type Result<T> = std::result::Result<T, ModuleFlowError>;

/// The main error type for ModuleFlow, encompassing all potential error cases.
#[derive(Error, Debug)]
pub enum ModuleFlowError {
    /// Error related to configuration initialisation or validation.
    ///
    /// This error occurs when there is a problem with configuration files or values.
    #[error("Configuration error: {message}.")]
    ConfigError {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the configuration file that caused the error.
        path: Option<PathBuf>,
    },

    /// Error encountered while reading a page source.
    ///
    /// Raised when a page file cannot be parsed, or when its document is
    /// neither a module list nor a page record carrying one.
    #[error("Page source error: {message}.")]
    SourceError {
        /// Detailed description of the source error.
        message: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error in HTML output generation.
    #[error("Output generation error: {message} at {path:?}.")]
    OutputGenerationError {
        /// Description of the output generation error.
        message: String,
        /// Path associated with the error.
        path: PathBuf,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error related to template registration or rendering.
    ///
    /// This variant is used when a template fails to parse, or when a render
    /// routine is invoked outside of the dispatcher and fails.
    #[error(
        "Template rendering error: {message} in template `{template}`."
    )]
    TemplateRenderingError {
        /// Description of the template rendering error.
        message: String,
        /// The specific template file or identifier associated with the error.
        template: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error encountered during file operations.
    #[error("File IO error at `{path:?}`: {source}")]
    IOError {
        /// Path associated with the IO error.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// General internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for ModuleFlowError {
    /// Converts a standard IO error into a `ModuleFlowError::IOError`
    /// with an empty path.
    fn from(source: std::io::Error) -> Self {
        ModuleFlowError::IOError {
            path: PathBuf::new(),
            source,
        }
    }
}

impl ModuleFlowError {
    /// Creates a `ConfigError` with a specific message.
    ///
    /// # Parameters
    /// - `message`: A description of the configuration error.
    /// - `path`: Optional path of the configuration file causing the error.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        ModuleFlowError::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Creates a `SourceError` with a specific message and optional source.
    pub fn source_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ModuleFlowError::SourceError {
            message: message.into(),
            source,
        }
    }

    /// Creates an `OutputGenerationError` with a specific message, path, and optional source.
    ///
    /// # Parameters
    /// - `message`: A description of the output generation error.
    /// - `path`: The path associated with the error.
    /// - `source`: An optional source error providing additional context.
    pub fn output_generation_error<S: Into<String>>(
        message: S,
        path: PathBuf,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ModuleFlowError::OutputGenerationError {
            message: message.into(),
            path,
            source,
        }
    }

    /// Creates a `TemplateRenderingError` with a message, template name, and optional source.
    pub fn template_rendering_error<S: Into<String>>(
        message: S,
        template: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ModuleFlowError::TemplateRenderingError {
            message: message.into(),
            template,
            source,
        }
    }

    /// Wraps an IO error as an `IOError` variant with the specified path.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        ModuleFlowError::IOError { path, source }
    }

    /// Creates a general internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        ModuleFlowError::InternalError(message.into())
    }
}
