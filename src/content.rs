//! # Rich Text Module
//!
//! Renders the Markdown bodies carried by `text`, `accordion` and `tabs`
//! modules, and screens URLs coming from the CMS.
//!
//! ## Key Features
//!
//! - **Markdown rendering** with optional tables, strikethrough and footnotes
//! - **Sanitisation** on the event stream: raw HTML is escaped and unsafe
//!   link and image targets are replaced with `#`
//! - **URL screening** against script-capable schemes

use crate::{ContentProcessor, ModuleFlowError, Result};
use pulldown_cmark::{
    html, CowStr, Event, Options as MarkdownOptions, Parser, Tag,
};
use serde::{Deserialize, Serialize};

/// URL schemes that are never emitted into a page.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Replacement target for links and images with an unsafe URL.
const NEUTRAL_URL: &str = "#";

/// Whether a URL is safe to emit into an attribute.
///
/// Relative URLs, fragments and ordinary schemes pass; `javascript:`,
/// `vbscript:` and `data:` do not, regardless of case or leading
/// whitespace.
pub fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Options for Markdown rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Enable table syntax.
    #[serde(default = "default_true")]
    pub tables: bool,
    /// Enable `~~strikethrough~~` syntax.
    #[serde(default = "default_true")]
    pub strikethrough: bool,
    /// Enable footnote syntax.
    #[serde(default)]
    pub footnotes: bool,
    /// Escape raw HTML and neutralise unsafe link targets.
    #[serde(default = "default_true")]
    pub sanitize: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: false,
            sanitize: true,
        }
    }
}

/// Markdown renderer for rich-text payloads.
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: MarkdownOptions,
    sanitize: bool,
}

impl MarkdownProcessor {
    /// Creates a new `MarkdownProcessor` with no extensions and
    /// sanitisation enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use moduleflow::content::MarkdownProcessor;
    /// let processor = MarkdownProcessor::new();
    /// ```
    pub fn new() -> Self {
        Self {
            options: MarkdownOptions::empty(),
            sanitize: true,
        }
    }

    /// Creates a processor from a [`MarkdownConfig`].
    pub fn from_config(config: &MarkdownConfig) -> Self {
        Self::new()
            .with_tables(config.tables)
            .with_strikethrough(config.strikethrough)
            .with_footnotes(config.footnotes)
            .with_sanitize(config.sanitize)
    }

    /// Enables or disables table support.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_TABLES, enable);
        self
    }

    /// Enables or disables strikethrough support.
    pub fn with_strikethrough(mut self, enable: bool) -> Self {
        self.options
            .set(MarkdownOptions::ENABLE_STRIKETHROUGH, enable);
        self
    }

    /// Enables or disables footnote support.
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_FOOTNOTES, enable);
        self
    }

    /// Enables or disables sanitisation of the rendered HTML.
    pub fn with_sanitize(mut self, enable: bool) -> Self {
        self.sanitize = enable;
        self
    }

}

/// Turns raw HTML into escaped text and points links and images with an
/// unsafe destination at `#`.
fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed(NEUTRAL_URL),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(NEUTRAL_URL),
            title,
            id,
        }),
        other => other,
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentProcessor for MarkdownProcessor {
    fn process(&self, content: &str) -> Result<String> {
        self.validate(content)?;

        let parser = Parser::new_ext(content, self.options);
        let mut html_output = String::with_capacity(content.len() * 2);
        if self.sanitize {
            html::push_html(&mut html_output, parser.map(sanitize_event));
        } else {
            html::push_html(&mut html_output, parser);
        }
        Ok(html_output)
    }

    fn validate(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ModuleFlowError::TemplateRenderingError {
                message: "Rich text cannot be empty".to_string(),
                template: "markdown".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_processor_basic() {
        let processor = MarkdownProcessor::new();
        let result =
            processor.process("# Test\n\nThis is a **test**.").unwrap();
        assert!(result.contains("<h1>"));
        assert!(result.contains("<strong>"));
    }

    #[test]
    fn test_markdown_processor_with_options() {
        let processor = MarkdownProcessor::new()
            .with_tables(true)
            .with_strikethrough(true);

        let input = "| A | B |\n|---|---|\n| 1 | 2 |\n\n~~strike~~";
        let result = processor.process(input).unwrap();
        assert!(result.contains("<table>"));
        assert!(result.contains("<del>"));
    }

    #[test]
    fn test_sanitization() {
        let processor = MarkdownProcessor::new();
        let input = "Hello\n\n<script>alert('xss')</script>\n\n[x](javascript:alert(1))";
        let result = processor.process(input).unwrap();
        assert!(!result.contains("<script>"));
        assert!(!result.contains("href=\"javascript:"));
    }

    #[test]
    fn test_uppercase_script_is_escaped() {
        let result = MarkdownProcessor::new()
            .process("<SCRIPT>alert(1)</SCRIPT>")
            .unwrap();
        assert!(!result.to_ascii_lowercase().contains("<script"));
        assert!(result.contains("&lt;SCRIPT&gt;"));
    }

    #[test]
    fn test_event_handler_markup_is_escaped() {
        let result = MarkdownProcessor::new()
            .process("Look: <img src=x onerror=alert(2)>")
            .unwrap();
        assert!(!result.contains("<img"));
        assert!(result.contains("&lt;img"));
    }

    #[test]
    fn test_mixed_case_javascript_link_is_neutralised() {
        let result = MarkdownProcessor::new()
            .process("[x](JavaScript:alert(3)) and ![pic](DATA:image/png;base64,AA)")
            .unwrap();
        assert!(result.contains("<a href=\"#\">x</a>"));
        assert!(result.contains("src=\"#\""));
        assert!(!result.to_ascii_lowercase().contains("javascript:"));
        assert!(!result.to_ascii_lowercase().contains("data:"));
    }

    #[test]
    fn test_safe_links_are_kept() {
        let result = MarkdownProcessor::new()
            .process("[docs](https://example.com/docs) and [home](/)")
            .unwrap();
        assert!(result.contains("href=\"https://example.com/docs\""));
        assert!(result.contains("href=\"/\""));
    }

    #[test]
    fn test_sanitization_can_be_disabled() {
        let processor = MarkdownProcessor::new().with_sanitize(false);
        let result = processor.process("<iframe></iframe>").unwrap();
        assert!(result.contains("<iframe>"));
    }

    #[test]
    fn test_validation() {
        let processor = MarkdownProcessor::new();
        assert!(processor.validate("").is_err());
        assert!(processor.validate("  \n ").is_err());
        assert!(processor.validate("# Valid content").is_ok());
    }

    #[test]
    fn test_url_screening() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("/contact"));
        assert!(is_safe_url("#top"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("  JavaScript:alert(1)"));
        assert!(!is_safe_url("java\tscript:alert(1)"));
        assert!(!is_safe_url("data:text/html;base64,AAAA"));
    }
}
