//! # HTML Output Generation
//!
//! Turns a rendered [`PageSkeleton`] into an HTML document and writes it to
//! disk. Each region becomes a landmark element (`<header>`, `<main>`,
//! `<aside>`, `<section>`, `<footer>`); main and sidebar share a
//! `page-row` wrapper when either is present. Layout weights are emitted as
//! `data-layout` attributes for the stylesheet to interpret.
//!
//! # Examples
//!
//! ```rust,no_run
//! use moduleflow::generators::html::{HtmlPageGenerator, PageOptions};
//! use moduleflow::OutputGenerator;
//! use std::path::PathBuf;
//!
//! let generator = HtmlPageGenerator::new(PageOptions::default())
//!     .with_minification(true);
//!
//! generator.generate(
//!     "<html><body>Hello World</body></html>",
//!     &PathBuf::from("output/index.html"),
//! ).unwrap();
//! ```

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use handlebars::html_escape;
use log::{debug, info};
use minify_html::{minify, Cfg};
use serde::{Deserialize, Serialize};

use crate::layout::{BucketLayout, PageSkeleton, Region};
use crate::module::Placement;
use crate::render::{OutputKind, RenderedModule};
use crate::{ModuleFlowError, OutputGenerator, Result};

/// Document-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    /// Contents of `<title>`.
    pub title: String,
    /// Value of `<html lang>`.
    pub lang: String,
    /// Controls HTML minification.
    pub minify: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "Untitled page".to_string(),
            lang: "en".to_string(),
            minify: false,
        }
    }
}

/// Assembles rendered pages into HTML documents.
#[derive(Debug, Clone, Default)]
pub struct HtmlPageGenerator {
    options: PageOptions,
}

impl HtmlPageGenerator {
    /// Creates a generator with the given document settings.
    pub fn new(options: PageOptions) -> Self {
        Self { options }
    }

    /// Enables or disables HTML minification.
    pub fn with_minification(mut self, enable: bool) -> Self {
        self.options.minify = enable;
        self
    }

    /// Sets the document title.
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.options.title = title.into();
        self
    }

    /// Returns the document settings.
    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    /// Builds the full document for a rendered page.
    ///
    /// An empty skeleton yields a document with an empty body.
    pub fn assemble(
        &self,
        skeleton: &PageSkeleton<RenderedModule>,
    ) -> Result<String> {
        let mut body = String::new();
        let regions = skeleton.regions();
        let row_members = regions
            .iter()
            .filter(|region| in_content_row(region.placement))
            .count();
        let mut row_seen = 0;

        for region in regions {
            let in_row = in_content_row(region.placement);
            if in_row && row_seen == 0 {
                body.push_str("<div class=\"page-row\">\n");
            }
            render_region(&mut body, region);
            if in_row {
                row_seen += 1;
                if row_seen == row_members {
                    body.push_str("</div>\n");
                }
            }
        }

        let document = format!(
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
            html_escape(&self.options.lang),
            html_escape(&self.options.title),
            body
        );

        info!(
            "Assembled page with {} regions and {} modules",
            regions.len(),
            skeleton.item_count()
        );

        if self.options.minify {
            self.minify_html(&document)
        } else {
            Ok(document)
        }
    }

    /// Minifies HTML content using the `minify-html` crate.
    fn minify_html(&self, content: &str) -> Result<String> {
        let cfg = Cfg {
            minify_css: true,
            minify_js: true,
            keep_closing_tags: true,
            ..Cfg::default()
        };
        String::from_utf8(minify(content.as_bytes(), &cfg)).map_err(|e| {
            ModuleFlowError::internal_error(format!(
                "HTML minification failed: {}",
                e
            ))
        })
    }
}

impl OutputGenerator for HtmlPageGenerator {
    fn generate(&self, content: &str, path: &Path) -> Result<()> {
        self.validate(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ModuleFlowError::io_error(parent.to_path_buf(), e)
            })?;
        }
        let file = File::create(path)
            .map_err(|e| ModuleFlowError::io_error(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("html") | Some("htm") => Ok(()),
            _ => Err(ModuleFlowError::output_generation_error(
                "Invalid file extension - expected .html",
                path.to_path_buf(),
                None,
            )),
        }
    }
}

fn in_content_row(placement: Placement) -> bool {
    matches!(placement, Placement::Main | Placement::Sidebar)
}

fn landmark(placement: Placement) -> &'static str {
    match placement {
        Placement::Header => "header",
        Placement::Main => "main",
        Placement::Sidebar => "aside",
        Placement::Footer => "footer",
        Placement::Other => "section",
    }
}

fn render_region(out: &mut String, region: &Region<RenderedModule>) {
    let element = landmark(region.placement);
    match &region.layout {
        BucketLayout::Class(class) => {
            _ = writeln!(out, "<{} class=\"{}\">", element, html_escape(class));
        }
        layout => {
            _ = writeln!(
                out,
                "<{} class=\"page-{}\" data-layout=\"{}\">",
                element,
                region.placement.as_str(),
                layout
            );
        }
    }
    for module in &region.items {
        render_module(out, module);
    }
    _ = writeln!(out, "</{}>", element);
}

fn render_module(out: &mut String, module: &RenderedModule) {
    let kind = match (module.kind, module.tag) {
        (OutputKind::LoginPrompt, _) => "login-prompt".to_string(),
        (_, Some(tag)) => tag.as_str().to_string(),
        (_, None) => "unknown".to_string(),
    };
    out.push_str("<div class=\"module\" data-module-type=\"");
    out.push_str(&html_escape(&kind));
    out.push('"');
    if let Some(id) = &module.id {
        out.push_str(" data-module-id=\"");
        out.push_str(&html_escape(&id.to_string()));
        out.push('"');
    }
    out.push_str(">\n");
    out.push_str(&module.html);
    out.push_str("\n</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compose, LayoutOverrides};
    use crate::module::{ModuleId, RawModule, VariantTag};
    use crate::section::group;
    use serde_json::json;
    use tempfile::TempDir;

    fn skeleton(
        modules: &[RawModule],
        overrides: &LayoutOverrides,
    ) -> PageSkeleton<RenderedModule> {
        compose(group(modules), overrides).map(|_, module| RenderedModule {
            id: module.id(),
            tag: VariantTag::parse(module.type_name().unwrap_or_default()),
            html: format!("<p>{}</p>", module.id_label()),
            kind: OutputKind::Module,
        })
    }

    #[test]
    fn test_regions_in_presentation_order() -> Result<()> {
        let modules = vec![
            RawModule::new(json!({ "id": "f", "type": "text", "placement": "footer" })),
            RawModule::new(json!({ "id": "s", "type": "text", "placement": "sidebar" })),
            RawModule::new(json!({ "id": "h", "type": "hero", "placement": "header" })),
            RawModule::new(json!({ "id": "m", "type": "text", "placement": "main" })),
            RawModule::new(json!({ "id": "o", "type": "text", "placement": "elsewhere" })),
        ];
        let html = HtmlPageGenerator::default()
            .assemble(&skeleton(&modules, &LayoutOverrides::new()))?;

        let positions: Vec<usize> = ["<header", "page-row", "<main", "<aside", "<section class=\"page-other\"", "<footer"]
            .iter()
            .map(|needle| html.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(html.contains("<main class=\"page-main\" data-layout=\"2/3\">"));
        assert!(html.contains("<aside class=\"page-sidebar\" data-layout=\"1/3\">"));
        assert!(html.contains("data-module-id=\"m\""));
        Ok(())
    }

    #[test]
    fn test_no_content_row_without_main_or_sidebar() -> Result<()> {
        let modules = vec![RawModule::new(json!({ "id": 1, "placement": "header" }))];
        let html = HtmlPageGenerator::default()
            .assemble(&skeleton(&modules, &LayoutOverrides::new()))?;
        assert!(!html.contains("page-row"));
        assert!(!html.contains("<main"));
        assert!(!html.contains("<aside"));
        Ok(())
    }

    #[test]
    fn test_sidebar_only_row_is_closed() -> Result<()> {
        let modules = vec![RawModule::new(json!({ "id": 1, "placement": "sidebar" }))];
        let html = HtmlPageGenerator::default()
            .assemble(&skeleton(&modules, &LayoutOverrides::new()))?;
        assert_eq!(html.matches("<div class=\"page-row\">").count(), 1);
        let row_end = html.find("</aside>\n</div>");
        assert!(row_end.is_some());
        Ok(())
    }

    #[test]
    fn test_class_override_is_verbatim() -> Result<()> {
        let modules = vec![RawModule::new(json!({ "id": 1, "placement": "sidebar" }))];
        let overrides = LayoutOverrides::new().with("sidebar", "custom-class");
        let html = HtmlPageGenerator::default().assemble(&skeleton(&modules, &overrides))?;
        assert!(html.contains("<aside class=\"custom-class\">"));
        Ok(())
    }

    #[test]
    fn test_title_is_escaped() -> Result<()> {
        let html = HtmlPageGenerator::default()
            .with_title("Fish & <Chips>")
            .assemble(&skeleton(&[], &LayoutOverrides::new()))?;
        assert!(html.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
        assert!(html.contains("<body>\n</body>"));
        Ok(())
    }

    #[test]
    fn test_login_prompt_wrapper() {
        let mut out = String::new();
        render_module(
            &mut out,
            &RenderedModule {
                id: Some(ModuleId::Int(7)),
                tag: None,
                html: "<a href=\"/login\">Sign in</a>".to_string(),
                kind: OutputKind::LoginPrompt,
            },
        );
        assert!(out.starts_with(
            "<div class=\"module\" data-module-type=\"login-prompt\" data-module-id=\"7\">"
        ));
    }

    #[test]
    fn test_minification() -> Result<()> {
        let modules = vec![RawModule::new(json!({ "id": 1, "type": "text" }))];
        let page = skeleton(&modules, &LayoutOverrides::new());
        let plain = HtmlPageGenerator::default().assemble(&page)?;
        let minified = HtmlPageGenerator::default()
            .with_minification(true)
            .assemble(&page)?;
        assert!(minified.len() < plain.len());
        assert!(minified.contains("<p>1</p>"));
        Ok(())
    }

    #[test]
    fn test_generate_creates_parent_dirs() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let output_path = temp_dir.path().join("site/pages/index.html");

        HtmlPageGenerator::default().generate("<h1>Test</h1>", &output_path)?;

        assert_eq!(fs::read_to_string(&output_path)?, "<h1>Test</h1>");
        Ok(())
    }

    #[test]
    fn test_generate_rejects_other_extensions() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let result = HtmlPageGenerator::default()
            .generate("<h1>Test</h1>", &temp_dir.path().join("index.txt"));
        assert!(matches!(
            result,
            Err(ModuleFlowError::OutputGenerationError { .. })
        ));
        Ok(())
    }
}
