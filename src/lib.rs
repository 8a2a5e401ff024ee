// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # ModuleFlow Library
//!
//! ModuleFlow renders pages authored in a headless CMS as ordered lists of
//! typed content modules. Each module is classified into one known
//! variant, grouped into its placement bucket, arranged into a page
//! skeleton and dispatched to the render routine of its variant. Modules
//! that are malformed, unknown, or hidden from the current viewer are
//! skipped without affecting the rest of the page.
//!
//! For more information, visit the [ModuleFlow documentation](https://docs.rs/moduleflow).

#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/moduleflow")]
#![crate_name = "moduleflow"]
#![crate_type = "lib"]

use crate::auth::{AuthGate, StaticAuthGate};
use crate::content::MarkdownProcessor;
use crate::core::config::Config;
use crate::generators::html::HtmlPageGenerator;
use crate::layout::{compose, LayoutOverrides, PageSkeleton};
use crate::module::{RawModule, Variant};
use crate::render::{DispatchContext, Dispatcher, RenderedModule};
use crate::section::group;
use crate::template::TemplateRenderer;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

pub use crate::core::error::{ModuleFlowError, Result};

/// Module containing core utilities, such as configuration and error handling.
pub mod core {
    /// Handles configuration of the ModuleFlow application.
    pub mod config;
    /// Contains error types and handling for ModuleFlow.
    pub mod error;
}

/// Authentication status and gates for members-only modules.
pub mod auth;

/// Classification of raw modules into variants.
pub mod classify;

/// Provides command-line interface utilities.
pub mod cli;

/// Markdown rendering and URL screening.
pub mod content;

/// Provides output generation utilities.
pub mod generators {
    /// HTML document assembly and file output.
    pub mod html;
}

/// Layout composition of grouped buckets.
pub mod layout;

/// The module data model.
pub mod module;

/// Dispatch of modules to render routines.
pub mod render;

/// Grouping of modules by placement.
pub mod section;

/// Loading page sources from disk.
pub mod source;

/// Provides template rendering utilities.
pub mod template;

/// Trait for content processing implementations.
///
/// Implementations of this trait transform rich-text fields into HTML.
pub trait ContentProcessor: Send + Sync + std::fmt::Debug {
    /// Processes the provided content.
    ///
    /// # Arguments
    /// * `content` - The content to be processed.
    ///
    /// # Returns
    /// * `Result<String>` - The processed content, or an error if processing fails.
    fn process(&self, content: &str) -> Result<String>;

    /// Validates the content without processing.
    ///
    /// # Arguments
    /// * `content` - The content to be validated.
    ///
    /// # Returns
    /// * `Result<()>` - Indicates success if the content is valid, or an error if invalid.
    fn validate(&self, content: &str) -> Result<()>;
}

/// A render routine for classified modules.
///
/// The dispatcher holds one routine per variant. Errors returned here never
/// reach the caller of the pipeline; the module is skipped instead.
pub trait VariantRenderer: Send + Sync + std::fmt::Debug {
    /// Renders a valid module.
    ///
    /// # Arguments
    /// * `module` - The raw record, for its id, placement and title.
    /// * `variant` - The narrowed payload.
    fn render(&self, module: &RawModule, variant: &Variant) -> Result<String>;

    /// Renders the sign-in prompt shown in place of a gated module.
    ///
    /// # Arguments
    /// * `module` - The gated record, for its id and title.
    /// * `login_url` - Where the viewer signs in.
    fn render_login_prompt(
        &self,
        module: &RawModule,
        login_url: &str,
    ) -> Result<String>;
}

/// Trait for output generation implementations.
///
/// Defines methods for generating output files.
pub trait OutputGenerator: Send + Sync + std::fmt::Debug {
    /// Writes the given content to the specified path.
    ///
    /// # Arguments
    /// * `content` - The content to be output.
    /// * `path` - The output file path.
    ///
    /// # Returns
    /// * `Result<()>` - Indicates success, or an error if generation fails.
    fn generate(&self, content: &str, path: &Path) -> Result<()>;

    /// Validates the output path.
    ///
    /// # Arguments
    /// * `path` - The output file path.
    ///
    /// # Returns
    /// * `Result<()>` - Indicates success if valid, or an error otherwise.
    fn validate(&self, path: &Path) -> Result<()>;
}

/// The explicit options a page is rendered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Render a placeholder for skipped modules instead of dropping them.
    pub diagnostics: bool,
    /// Sort each bucket by the modules' `order` field.
    pub respect_order_field: bool,
    /// Sign-in page offered to anonymous viewers of gated modules.
    pub login_url: Option<String>,
    /// Configured layout overrides. Per-page overrides take precedence.
    pub layout: LayoutOverrides,
}

/// Main page rendering pipeline for ModuleFlow.
#[derive(Debug)]
pub struct ModuleFlow {
    options: PipelineOptions,
    dispatcher: Dispatcher,
    auth: Arc<dyn AuthGate>,
}

impl ModuleFlow {
    /// Creates a pipeline for anonymous viewers.
    pub fn new(options: PipelineOptions, dispatcher: Dispatcher) -> Self {
        Self {
            options,
            dispatcher,
            auth: Arc::new(StaticAuthGate::default()),
        }
    }

    /// Creates a pipeline from a loaded configuration, with the built-in
    /// templates and any template directory it names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut renderer = TemplateRenderer::new()?
            .with_markdown(MarkdownProcessor::from_config(&config.markdown))
            .with_strict_mode(config.render.strict_templates);
        if let Some(dir) = &config.render.template_dir {
            renderer = renderer.with_template_dir(dir)?;
        }
        Ok(Self::new(
            config.pipeline_options(),
            Dispatcher::new(Arc::new(renderer)),
        ))
    }

    /// Uses `gate` to decide what viewers of gated modules see.
    pub fn with_auth_gate<G: AuthGate + 'static>(mut self, gate: G) -> Self {
        self.auth = Arc::new(gate);
        self
    }

    /// Returns the options this pipeline runs with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Renders a page into its laid-out skeleton.
    ///
    /// Runs grouping, optional `order` sorting, layout composition and
    /// dispatch. Regions whose modules were all skipped are dropped. This
    /// never fails: problem modules are skipped and logged.
    ///
    /// # Examples
    ///
    /// ```
    /// use moduleflow::layout::LayoutOverrides;
    /// use moduleflow::module::{Placement, RawModule};
    /// use moduleflow::render::Dispatcher;
    /// use moduleflow::template::TemplateRenderer;
    /// use moduleflow::{ModuleFlow, PipelineOptions};
    /// use serde_json::json;
    /// use std::sync::Arc;
    ///
    /// let flow = ModuleFlow::new(
    ///     PipelineOptions::default(),
    ///     Dispatcher::new(Arc::new(TemplateRenderer::new()?)),
    /// );
    /// let modules = vec![
    ///     RawModule::new(json!({ "id": 1, "type": "hero", "title": "Welcome", "placement": "header" })),
    ///     RawModule::new(json!({ "id": 2, "type": "unsupported-future-type" })),
    /// ];
    /// let page = flow.render_page(&modules, &LayoutOverrides::new());
    ///
    /// assert_eq!(page.item_count(), 1);
    /// assert!(page.region(Placement::Main).is_none());
    /// # Ok::<(), moduleflow::ModuleFlowError>(())
    /// ```
    pub fn render_page(
        &self,
        modules: &[RawModule],
        overrides: &LayoutOverrides,
    ) -> PageSkeleton<RenderedModule> {
        let context = DispatchContext {
            auth: self.auth.status(),
            diagnostics: self.options.diagnostics,
            login_url: self.options.login_url.clone(),
        };
        debug!(
            "Rendering {} modules (auth {}, diagnostics {})",
            modules.len(),
            context.auth,
            context.diagnostics
        );

        let mut buckets = group(modules);
        if self.options.respect_order_field {
            buckets = buckets.sort_by_order();
        }

        let overrides = self.options.layout.clone().layered(overrides);
        let page = compose(buckets, &overrides)
            .map(|_, module| {
                self.dispatcher.dispatch(module, &context).into_output()
            })
            .flatten();

        info!(
            "Rendered {} of {} modules into {} regions",
            page.item_count(),
            modules.len(),
            page.regions().len()
        );
        page
    }

    /// Renders a page and assembles the HTML document.
    pub fn render_document(
        &self,
        modules: &[RawModule],
        overrides: &LayoutOverrides,
        generator: &HtmlPageGenerator,
    ) -> Result<String> {
        generator.assemble(&self.render_page(modules, overrides))
    }
}
