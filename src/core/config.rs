//! # Configuration Module
//!
//! Configuration management for ModuleFlow. Settings come from a TOML file,
//! environment variables and programmatic overrides, applied in that order,
//! and are turned into the explicit [`PipelineOptions`] the renderer runs
//! with. The renderer itself never reads the environment.
//!
//! ## Features
//!
//! - Multiple configuration sources (TOML, environment variables, code)
//! - Validation with errors naming the offending key
//! - Profiles, with development defaults such as render diagnostics
//!
//! ## Example
//!
//! ```rust,no_run
//! use moduleflow::core::config::{ConfigBuilder, Profile};
//! use std::path::Path;
//!
//! let config = ConfigBuilder::new()
//!     .with_file(Path::new("moduleflow.toml"))
//!     .with_env_prefix("MODULEFLOW_")
//!     .with_profile(Profile::Production)
//!     .build()
//!     .unwrap();
//!
//! let config_read = config.read();
//! assert_eq!(config_read.profile, Profile::Production);
//! ```
//!
//! Environment variables name a section and key separated by a double
//! underscore, so `MODULEFLOW_RENDER__DIAGNOSTICS=true` sets
//! `render.diagnostics`.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::content::{is_safe_url, MarkdownConfig};
use crate::generators::html::PageOptions;
use crate::layout::LayoutOverrides;
use crate::{ModuleFlowError, PipelineOptions, Result};

/// Specifies operational profiles for configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Development profile: skipped modules render a visible diagnostic.
    Development,
    /// Staging profile for intermediate testing between development and production.
    Staging,
    /// Production profile.
    #[default]
    Production,
    /// Custom profile enabling specific user configurations.
    Custom,
}

impl Profile {
    /// Parses a profile name; unrecognised names map to `Custom`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" => Profile::Development,
            "staging" => Profile::Staging,
            "production" | "prod" => Profile::Production,
            _ => Profile::Custom,
        }
    }
}

/// Represents the main configuration structure encompassing all application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    /// Indicates the current operational profile.
    pub profile: Profile,

    #[serde(default)]
    /// Settings for module dispatch and the default templates.
    pub render: RenderConfig,

    #[serde(default)]
    /// Layout overrides by bucket name (`main = "3/4"`).
    pub layout: BTreeMap<String, String>,

    #[serde(default)]
    /// Markdown options for rich-text modules.
    pub markdown: MarkdownConfig,

    #[serde(default)]
    /// Settings for gated modules.
    pub auth: AuthConfig,

    #[serde(default)]
    /// Settings for the assembled HTML document.
    pub output: OutputConfig,

    #[serde(default)]
    /// Holds custom configuration values specified by the user.
    pub custom: HashMap<String, TomlValue>,
}

/// Configuration settings for module dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    /// Render a placeholder for skipped modules. When unset, follows the
    /// profile: on for `development`, off otherwise.
    pub diagnostics: Option<bool>,

    #[serde(default)]
    /// Sort each bucket by the modules' `order` field before rendering.
    pub respect_order_field: bool,

    #[serde(default)]
    /// Directory of `*.hbs` files overriding the built-in templates.
    pub template_dir: Option<PathBuf>,

    #[serde(default)]
    /// Fail templates that reference missing variables.
    pub strict_templates: bool,
}

/// Configuration settings for gated modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    /// Sign-in page offered to anonymous viewers of gated modules. Without
    /// one, gated modules are hidden from them.
    pub login_url: Option<String>,
}

/// Configuration settings for the assembled document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    /// Minify the generated HTML.
    pub minify: bool,

    #[serde(default = "default_title")]
    /// Document title.
    pub title: String,

    #[serde(default = "default_lang")]
    /// Document language.
    pub lang: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            minify: false,
            title: default_title(),
            lang: default_lang(),
        }
    }
}

/// Builds a `Config` instance by allowing multiple configuration options to be set.
///
/// The `ConfigBuilder` provides methods for customising settings by specifying configuration files, environment variables, profiles, and overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    profile: Option<Profile>,
    overrides: Vec<(String, TomlValue)>,
}

impl ConfigBuilder {
    /// Initialises a new `ConfigBuilder` instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration file to the builder.
    ///
    /// # Parameters
    /// - `path`: The path to the TOML configuration file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a prefix for environment variables to override configuration values.
    ///
    /// # Parameters
    /// - `prefix`: The prefix for environment variables (e.g., "MODULEFLOW_").
    pub fn with_env_prefix<S: Into<String>>(
        mut self,
        prefix: S,
    ) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets the profile for the configuration, such as Development or Production.
    pub fn with_profile<P: Into<Profile>>(
        mut self,
        profile: P,
    ) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Adds a key-value pair to override configuration values.
    ///
    /// Keys use dotted section paths (`render.diagnostics`,
    /// `layout.sidebar`). Overrides apply in the order they were added.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<TomlValue>,
    {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Builds the final configuration by applying all specified settings and overrides.
    ///
    /// Loads configuration from file, applies environment and manual overrides,
    /// and validates the final configuration.
    pub fn build(self) -> Result<Arc<RwLock<Config>>> {
        let mut config = if let Some(path) = self.config_file {
            load_from_file(&path)?
        } else {
            Config::default()
        };

        if let Some(prefix) = self.env_prefix {
            apply_env_overrides(&mut config, &prefix);
        }

        for (key, value) in &self.overrides {
            apply_config_value(&mut config, key, value)?;
        }

        if let Some(profile) = self.profile {
            config.profile = profile;
        }

        validate_config(&config)?;

        Ok(Arc::new(RwLock::new(config)))
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    /// Whether skipped modules render a diagnostic placeholder.
    pub fn diagnostics(&self) -> bool {
        self.render
            .diagnostics
            .unwrap_or(self.profile == Profile::Development)
    }

    /// The explicit options the render pipeline runs with.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            diagnostics: self.diagnostics(),
            respect_order_field: self.render.respect_order_field,
            login_url: self.auth.login_url.clone(),
            layout: LayoutOverrides::from_map(&self.layout),
        }
    }

    /// The options of the assembled HTML document.
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            title: self.output.title.clone(),
            lang: self.output.lang.clone(),
            minify: self.output.minify,
        }
    }

    /// Retrieves a custom configuration value by key, if it exists.
    ///
    /// # Returns
    /// - `Ok(Some(T))` if the key exists and can be converted to the specified type.
    /// - `Ok(None)` if the key does not exist.
    /// - `Err` if the key exists but cannot be converted to the specified type.
    pub fn get_custom<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        self.custom
            .get(key)
            .map(|v| {
                TomlValue::try_into(v.clone()).map_err(|e| {
                    ModuleFlowError::config_error(
                        format!("Invalid custom config value: {}", e),
                        None,
                    )
                })
            })
            .transpose()
    }

    /// Sets a custom configuration value for the given key.
    pub fn set_custom<T: Serialize>(
        &mut self,
        key: &str,
        value: T,
    ) -> Result<()> {
        let value = TomlValue::try_from(value).map_err(|e| {
            ModuleFlowError::config_error(
                format!("Invalid custom config value: {}", e),
                None,
            )
        })?;
        _ = self.custom.insert(key.to_string(), value);
        Ok(())
    }
}

// Internal helper functions

fn load_from_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        ModuleFlowError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        ModuleFlowError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })
}

fn apply_env_overrides(config: &mut Config, prefix: &str) {
    for (key, value) in env::vars() {
        let Some(stripped) = key.strip_prefix(prefix) else {
            continue;
        };
        let config_key = stripped
            .trim_start_matches('_')
            .to_lowercase()
            .replace("__", ".");
        if let Err(e) = apply_config_value(config, &config_key, &value) {
            warn!("Ignoring environment variable {}: {}", key, e);
        }
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(template_dir) = &config.render.template_dir {
        validate_path(template_dir, "template")?;
    }

    if let Some(login_url) = &config.auth.login_url {
        if login_url.trim().is_empty() || !is_safe_url(login_url) {
            return Err(ModuleFlowError::config_error(
                format!("Invalid auth.login_url: {}", login_url),
                None,
            ));
        }
    }

    if config.output.lang.trim().is_empty() {
        return Err(ModuleFlowError::config_error(
            "output.lang cannot be empty",
            None,
        ));
    }

    Ok(())
}

fn apply_config_value<T: ToString>(
    config: &mut Config,
    key: &str,
    value: &T,
) -> Result<()> {
    let value_str = value.to_string().trim_matches('"').to_string();
    if key == "profile" {
        config.profile = Profile::from_name(&value_str);
        return Ok(());
    }

    let Some((section, name)) = key.split_once('.') else {
        return Err(ModuleFlowError::config_error(
            format!("Unknown configuration key: {}", key),
            None,
        ));
    };

    match (section, name) {
        ("render", "diagnostics") => {
            config.render.diagnostics = Some(parse_bool(key, &value_str)?);
        }
        ("render", "respect_order_field") => {
            config.render.respect_order_field =
                parse_bool(key, &value_str)?;
        }
        ("render", "template_dir") => {
            config.render.template_dir = Some(PathBuf::from(value_str));
        }
        ("render", "strict_templates") => {
            config.render.strict_templates = parse_bool(key, &value_str)?;
        }
        ("layout", bucket) => {
            _ = config.layout.insert(bucket.to_string(), value_str);
        }
        ("markdown", "tables") => {
            config.markdown.tables = parse_bool(key, &value_str)?;
        }
        ("markdown", "strikethrough") => {
            config.markdown.strikethrough = parse_bool(key, &value_str)?;
        }
        ("markdown", "footnotes") => {
            config.markdown.footnotes = parse_bool(key, &value_str)?;
        }
        ("markdown", "sanitize") => {
            config.markdown.sanitize = parse_bool(key, &value_str)?;
        }
        ("auth", "login_url") => {
            config.auth.login_url =
                Some(value_str).filter(|url| !url.is_empty());
        }
        ("output", "minify") => {
            config.output.minify = parse_bool(key, &value_str)?;
        }
        ("output", "title") => config.output.title = value_str,
        ("output", "lang") => config.output.lang = value_str,
        ("custom", custom_key) => {
            _ = config
                .custom
                .insert(custom_key.to_string(), TomlValue::String(value_str));
        }
        _ => {
            return Err(ModuleFlowError::config_error(
                format!("Unknown configuration key: {}", key),
                None,
            ));
        }
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|e| {
        ModuleFlowError::config_error(
            format!("Invalid {} value '{}': {}", key, value, e),
            None,
        )
    })
}

fn validate_path(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        return Err(ModuleFlowError::config_error(
            format!(
                "{} directory does not exist: {}",
                name,
                path.display()
            ),
            Some(path.to_path_buf()),
        ));
    }

    if !path.is_dir() {
        return Err(ModuleFlowError::config_error(
            format!(
                "{} path is not a directory: {}",
                name,
                path.display()
            ),
            Some(path.to_path_buf()),
        ));
    }

    Ok(())
}

// Default value functions
fn default_title() -> String {
    "Untitled page".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}
