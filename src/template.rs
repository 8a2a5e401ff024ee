//! # Template Rendering Module
//!
//! The default render routines: one Handlebars template per variant, plus a
//! sign-in prompt for gated modules.
//!
//! ## Features
//!
//! - Built-in template for every variant
//! - Per-variant overrides loaded from a template directory (`<type>.hbs`)
//! - Template syntax validated at load time
//! - `markdown` helper for rich-text fields
//! - Optional strict mode for missing variables

use crate::content::{MarkdownConfig, MarkdownProcessor};
use crate::module::{RawModule, Variant, VariantTag};
use crate::{ContentProcessor, ModuleFlowError, Result, VariantRenderer};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext,
    RenderError, RenderErrorReason, Template,
};
use log::debug;
use parking_lot::RwLock;
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the template used for sign-in prompts.
pub const LOGIN_PROMPT_TEMPLATE: &str = "login-prompt";

const HERO: &str = r#"<section class="hero">
{{#if background_image}}<img class="hero-background" src="{{background_image.url}}" alt="{{background_image.alt}}">{{/if}}
<h1>{{title}}</h1>
{{#if subtitle}}<p class="hero-subtitle">{{subtitle}}</p>{{/if}}
{{#if cta}}<a class="button" href="{{cta.url}}">{{cta.label}}</a>{{/if}}
</section>"#;

const CTA: &str = r#"<section class="cta">
<h2>{{title}}</h2>
{{#if description}}<p>{{description}}</p>{{/if}}
<a class="button" href="{{button.url}}">{{button.label}}</a>
</section>"#;

const SELLING_POINTS: &str = r#"<section class="selling-points">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<ul>
{{#each points}}<li>{{#if icon}}<span class="icon" data-icon="{{icon}}"></span>{{/if}}<h3>{{title}}</h3>{{#if description}}<p>{{description}}</p>{{/if}}</li>
{{/each}}</ul>
</section>"#;

const TESTIMONIALS: &str = r#"<section class="testimonials">
{{#if title}}<h2>{{title}}</h2>{{/if}}
{{#each testimonials}}<figure class="testimonial">
<blockquote>{{content}}</blockquote>
<figcaption>{{#if author_image}}<img src="{{author_image.url}}" alt="{{author_name}}">{{/if}}<cite>{{author_name}}</cite>{{#if author_position}}, <span>{{author_position}}</span>{{/if}}</figcaption>
</figure>
{{/each}}</section>"#;

const FEATURED_POSTS: &str = r#"<section class="featured-posts">
{{#if title}}<h2>{{title}}</h2>{{/if}}
{{#each posts}}<article>
{{#if image}}<img src="{{image.url}}" alt="{{image.alt}}">{{/if}}
<h3><a href="/blog/{{slug}}">{{title}}</a></h3>
{{#if excerpt}}<p>{{excerpt}}</p>{{/if}}
</article>
{{/each}}</section>"#;

const STATS: &str = r#"<section class="stats">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<dl>
{{#each stats}}<div class="stat"><dt>{{label}}</dt><dd>{{value}}</dd></div>
{{/each}}</dl>
</section>"#;

const GALLERY: &str = r#"<section class="gallery">
{{#if title}}<h2>{{title}}</h2>{{/if}}
{{#each images}}<figure><img src="{{url}}" alt="{{alt}}" loading="lazy">{{#if caption}}<figcaption>{{caption}}</figcaption>{{/if}}</figure>
{{/each}}</section>"#;

const TEXT: &str = r#"<section class="text">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<div class="rich-text">{{markdown body}}</div>
</section>"#;

const FORM: &str = r#"<section class="form">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<form method="post"{{#if action}} action="{{action}}"{{/if}}>
{{#each fields}}<label>{{label}} <input type="{{kind}}" name="{{name}}"{{#if required}} required{{/if}}></label>
{{/each}}<button type="submit">{{#if submit_label}}{{submit_label}}{{else}}Submit{{/if}}</button>
</form>
</section>"#;

const ACCORDION: &str = r#"<section class="accordion">
{{#if title}}<h2>{{title}}</h2>{{/if}}
{{#each items}}<details><summary>{{title}}</summary><div class="rich-text">{{markdown content}}</div></details>
{{/each}}</section>"#;

const TABS: &str = r#"<section class="tabs">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<div role="tablist">
{{#each tabs}}<button role="tab" id="tab-{{@root.id}}-{{@index}}" aria-controls="panel-{{@root.id}}-{{@index}}" aria-selected="{{#if @first}}true{{else}}false{{/if}}">{{title}}</button>
{{/each}}</div>
{{#each tabs}}<div role="tabpanel" id="panel-{{@root.id}}-{{@index}}" aria-labelledby="tab-{{@root.id}}-{{@index}}"{{#unless @first}} hidden{{/unless}}><div class="rich-text">{{markdown content}}</div></div>
{{/each}}</section>"#;

const VIDEO: &str = r#"<section class="video">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<figure><iframe src="{{url}}" title="{{#if title}}{{title}}{{else}}Video{{/if}}" loading="lazy" allowfullscreen></iframe>{{#if caption}}<figcaption>{{caption}}</figcaption>{{/if}}</figure>
</section>"#;

const CHART: &str = r#"<section class="chart" data-chart-type="{{chart_type}}">
{{#if title}}<h2>{{title}}</h2>{{/if}}
<ul class="chart-bars">
{{#each bars}}<li data-percent="{{percent}}"><span class="chart-label">{{label}}</span> <span class="chart-value">{{value}}</span></li>
{{/each}}</ul>
</section>"#;

const LOGIN_PROMPT: &str = r#"<div class="login-prompt">
<p>{{#if title}}<strong>{{title}}</strong> is available to members.{{else}}This content is available to members.{{/if}}</p>
<a class="button" href="{{login_url}}">Sign in</a>
</div>"#;

/// Returns the built-in template of a variant.
pub fn builtin_template(tag: VariantTag) -> &'static str {
    match tag {
        VariantTag::Hero => HERO,
        VariantTag::Cta => CTA,
        VariantTag::SellingPoints => SELLING_POINTS,
        VariantTag::Testimonials => TESTIMONIALS,
        VariantTag::FeaturedPosts => FEATURED_POSTS,
        VariantTag::Stats => STATS,
        VariantTag::Gallery => GALLERY,
        VariantTag::Text => TEXT,
        VariantTag::Form => FORM,
        VariantTag::Accordion => ACCORDION,
        VariantTag::Tabs => TABS,
        VariantTag::Video => VIDEO,
        VariantTag::Chart => CHART,
    }
}

/// Handlebars-backed render routines for every variant.
#[derive(Clone)]
pub struct TemplateRenderer {
    engine: Arc<RwLock<Handlebars<'static>>>,
    template_dir: Option<PathBuf>,
    strict_mode: bool,
}

impl fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("template_dir", &self.template_dir)
            .field("strict_mode", &self.strict_mode)
            .finish()
    }
}

impl TemplateRenderer {
    /// Creates a renderer with the built-in templates and default
    /// Markdown options.
    ///
    /// # Examples
    ///
    /// ```
    /// use moduleflow::template::TemplateRenderer;
    /// use moduleflow::module::VariantTag;
    ///
    /// let renderer = TemplateRenderer::new()?;
    /// assert!(renderer.has_template(VariantTag::Hero.as_str()));
    /// # Ok::<(), moduleflow::ModuleFlowError>(())
    /// ```
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::html_escape);

        for tag in VariantTag::ALL {
            register(&mut handlebars, tag.as_str(), builtin_template(tag))?;
        }
        register(&mut handlebars, LOGIN_PROMPT_TEMPLATE, LOGIN_PROMPT)?;

        let renderer = Self {
            engine: Arc::new(RwLock::new(handlebars)),
            template_dir: None,
            strict_mode: false,
        };
        renderer.register_markdown_helper(MarkdownProcessor::from_config(
            &MarkdownConfig::default(),
        ));
        Ok(renderer)
    }

    /// Uses `processor` for the `markdown` helper.
    pub fn with_markdown(self, processor: MarkdownProcessor) -> Self {
        self.register_markdown_helper(processor);
        self
    }

    /// Enables or disables strict mode, where a template referencing a
    /// missing variable fails to render.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self.engine.write().set_strict_mode(strict);
        self
    }

    /// Replaces one template.
    ///
    /// `name` is a variant tag, [`LOGIN_PROMPT_TEMPLATE`], or the name of a
    /// partial other templates include.
    pub fn with_template(self, name: &str, source: &str) -> Result<Self> {
        {
            let mut engine = self.engine.write();
            if is_routine_template(name) {
                register(&mut engine, name, source)?;
            } else {
                engine.register_partial(name, source).map_err(|e| {
                    ModuleFlowError::template_rendering_error(
                        format!("Failed to register partial: {}", e),
                        name.to_string(),
                        Some(Box::new(e)),
                    )
                })?;
            }
        }
        Ok(self)
    }

    /// Loads `*.hbs` files from `dir`.
    ///
    /// A file named after a variant (`hero.hbs`) or `login-prompt.hbs`
    /// replaces that template; any other file is registered as a partial.
    pub fn with_template_dir(mut self, dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ModuleFlowError::template_rendering_error(
                format!("Failed to read template directory: {}", e),
                dir.display().to_string(),
                Some(Box::new(e)),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("hbs")
            {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    ModuleFlowError::template_rendering_error(
                        "Invalid template filename",
                        path.display().to_string(),
                        None,
                    )
                })?
                .to_string();
            let source = std::fs::read_to_string(&path)
                .map_err(|e| ModuleFlowError::io_error(path.clone(), e))?;

            debug!("Loading template `{}` from {}", name, path.display());
            self = self.with_template(&name, &source)?;
        }

        self.template_dir = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Whether a template of this name is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.engine.read().has_template(name)
    }

    fn render_named(&self, name: &str, context: &JsonValue) -> Result<String> {
        self.engine.read().render(name, context).map_err(|e| {
            ModuleFlowError::template_rendering_error(
                format!("Template rendering failed: {}", e),
                name.to_string(),
                Some(Box::new(e)),
            )
        })
    }

    fn register_markdown_helper(&self, processor: MarkdownProcessor) {
        let helper_fn = move |h: &Helper,
                              _: &Handlebars,
                              _: &Context,
                              _: &mut RenderContext,
                              out: &mut dyn Output|
              -> HelperResult {
            let text = h
                .param(0)
                .and_then(|p| p.value().as_str())
                .unwrap_or_default();
            if text.trim().is_empty() {
                return Ok(());
            }
            let html = processor.process(text).map_err(|e| {
                RenderError::from(RenderErrorReason::Other(e.to_string()))
            })?;
            out.write(&html)?;
            Ok(())
        };

        self.engine
            .write()
            .register_helper("markdown", Box::new(helper_fn));
    }
}

impl VariantRenderer for TemplateRenderer {
    fn render(&self, module: &RawModule, variant: &Variant) -> Result<String> {
        let context = template_context(module, variant)?;
        self.render_named(variant.tag().as_str(), &context)
    }

    fn render_login_prompt(
        &self,
        module: &RawModule,
        login_url: &str,
    ) -> Result<String> {
        let context = json!({
            "id": module.id_label(),
            "type": module.type_name(),
            "title": module.title(),
            "login_url": login_url,
        });
        self.render_named(LOGIN_PROMPT_TEMPLATE, &context)
    }
}

fn is_routine_template(name: &str) -> bool {
    name == LOGIN_PROMPT_TEMPLATE || VariantTag::parse(name).is_some()
}

fn register(
    engine: &mut Handlebars<'static>,
    name: &str,
    source: &str,
) -> Result<()> {
    validate_template(name, source)?;
    engine.register_template_string(name, source).map_err(|e| {
        ModuleFlowError::template_rendering_error(
            format!("Failed to register template: {}", e),
            name.to_string(),
            Some(Box::new(e)),
        )
    })
}

/// Checks template syntax without registering it.
pub fn validate_template(name: &str, source: &str) -> Result<()> {
    _ = Template::compile(source).map_err(|e| {
        ModuleFlowError::template_rendering_error(
            format!("Template validation failed: {}", e),
            name.to_string(),
            Some(Box::new(e)),
        )
    })?;
    Ok(())
}

/// Builds the data a variant template sees: the payload's fields plus
/// `id`, `type` and `placement`.
fn template_context(module: &RawModule, variant: &Variant) -> Result<JsonValue> {
    let mut context = variant.to_json().map_err(|e| {
        ModuleFlowError::template_rendering_error(
            format!("Failed to serialise payload: {}", e),
            variant.tag().to_string(),
            Some(Box::new(e)),
        )
    })?;

    if let Variant::Chart(chart) = variant {
        let bars: Vec<JsonValue> = chart
            .series
            .iter()
            .zip(chart.bar_percentages())
            .map(|(point, percent)| {
                json!({
                    "label": point.label,
                    "value": point.value,
                    "percent": percent as u64,
                })
            })
            .collect();
        context["bars"] = JsonValue::Array(bars);
    }

    context["id"] = JsonValue::String(module.id_label());
    context["type"] = JsonValue::String(variant.tag().as_str().to_string());
    context["placement"] =
        JsonValue::String(module.placement().as_str().to_string());
    Ok(context)
}
