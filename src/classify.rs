//! # Classifier
//!
//! Narrows an untrusted [`RawModule`] to exactly one known [`Variant`], or
//! to [`Classification::Invalid`] with the reason it does not apply.
//!
//! Classification is discriminant-first: the `type` tag selects the
//! payload shape, and the payload is only used to validate that choice,
//! never to re-classify. The result depends on the module's own fields
//! alone, so the same record always classifies the same way.

use crate::content::is_safe_url;
use crate::module::{
    Accordion, Chart, Cta, FeaturedPosts, Form, Gallery, Hero, Image,
    RawModule, SellingPoints, Stats, Tabs, Testimonials, Text, Variant,
    VariantTag, Video,
};
use serde::de::DeserializeOwned;
use std::fmt;

/// The outcome of classifying one module.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The module is a valid instance of exactly this variant.
    Valid(Variant),
    /// The module does not apply.
    Invalid(InvalidReason),
}

impl Classification {
    /// Returns the variant tag of a valid classification.
    pub fn tag(&self) -> Option<VariantTag> {
        match self {
            Classification::Valid(variant) => Some(variant.tag()),
            Classification::Invalid(_) => None,
        }
    }

    /// Whether the module classified as a known variant.
    pub fn is_valid(&self) -> bool {
        matches!(self, Classification::Valid(_))
    }
}

/// Why a module classified as invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The record carries no string `type` field.
    MissingType,
    /// The `type` field names no known variant.
    UnknownType(String),
    /// The payload does not have the variant's shape.
    MalformedPayload {
        /// The declared variant.
        tag: VariantTag,
        /// What the payload parser rejected.
        message: String,
    },
    /// A required field is empty or blank.
    EmptyPayload {
        /// The declared variant.
        tag: VariantTag,
        /// The offending field.
        field: &'static str,
    },
    /// A link or media field uses a disallowed URL scheme.
    UnsafeUrl {
        /// The declared variant.
        tag: VariantTag,
        /// The offending field.
        field: &'static str,
    },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingType => {
                f.write_str("module has no type")
            }
            InvalidReason::UnknownType(name) => {
                write!(f, "unknown module type `{}`", name)
            }
            InvalidReason::MalformedPayload { tag, message } => {
                write!(f, "malformed `{}` payload: {}", tag, message)
            }
            InvalidReason::EmptyPayload { tag, field } => {
                write!(f, "`{}` module requires a non-empty `{}`", tag, field)
            }
            InvalidReason::UnsafeUrl { tag, field } => {
                write!(f, "`{}` module has an unsafe url in `{}`", tag, field)
            }
        }
    }
}

/// A payload fault found after the payload parsed.
enum Fault {
    Empty(&'static str),
    UnsafeUrl(&'static str),
}

/// Presence and non-emptiness rules of a variant payload.
trait Payload: DeserializeOwned {
    fn check(&self) -> Result<(), Fault>;
}

fn require_text(value: &str, field: &'static str) -> Result<(), Fault> {
    if value.trim().is_empty() {
        Err(Fault::Empty(field))
    } else {
        Ok(())
    }
}

fn require_items<T>(items: &[T], field: &'static str) -> Result<(), Fault> {
    if items.is_empty() {
        Err(Fault::Empty(field))
    } else {
        Ok(())
    }
}

fn require_safe_url(url: &str, field: &'static str) -> Result<(), Fault> {
    if is_safe_url(url) {
        Ok(())
    } else {
        Err(Fault::UnsafeUrl(field))
    }
}

fn check_image(image: Option<&Image>, field: &'static str) -> Result<(), Fault> {
    match image {
        Some(image) => require_safe_url(&image.url, field),
        None => Ok(()),
    }
}

impl Payload for Hero {
    fn check(&self) -> Result<(), Fault> {
        require_text(&self.title, "title")?;
        check_image(self.background_image.as_ref(), "background_image")?;
        match &self.cta {
            Some(link) => require_safe_url(&link.url, "cta"),
            None => Ok(()),
        }
    }
}

impl Payload for Cta {
    fn check(&self) -> Result<(), Fault> {
        require_text(&self.title, "title")?;
        require_text(&self.button.label, "button")?;
        require_text(&self.button.url, "button")?;
        require_safe_url(&self.button.url, "button")
    }
}

impl Payload for SellingPoints {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.points, "points")
    }
}

impl Payload for Testimonials {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.testimonials, "testimonials")?;
        self.testimonials.iter().try_for_each(|testimonial| {
            check_image(testimonial.author_image.as_ref(), "testimonials")
        })
    }
}

impl Payload for FeaturedPosts {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.posts, "posts")
    }
}

impl Payload for Stats {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.stats, "stats")
    }
}

impl Payload for Gallery {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.images, "images")?;
        self.images
            .iter()
            .try_for_each(|image| require_safe_url(&image.url, "images"))
    }
}

impl Payload for Text {
    fn check(&self) -> Result<(), Fault> {
        require_text(&self.body, "body")
    }
}

impl Payload for Form {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.fields, "fields")?;
        match &self.action {
            Some(action) => require_safe_url(action, "action"),
            None => Ok(()),
        }
    }
}

impl Payload for Accordion {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.items, "items")
    }
}

impl Payload for Tabs {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.tabs, "tabs")
    }
}

impl Payload for Video {
    fn check(&self) -> Result<(), Fault> {
        require_text(&self.url, "url")?;
        require_safe_url(&self.url, "url")
    }
}

impl Payload for Chart {
    fn check(&self) -> Result<(), Fault> {
        require_items(&self.series, "series")
    }
}

fn narrow<P: Payload>(
    module: &RawModule,
    tag: VariantTag,
    wrap: fn(P) -> Variant,
) -> Classification {
    let payload = match P::deserialize(module.as_value()) {
        Ok(payload) => payload,
        Err(e) => {
            return Classification::Invalid(
                InvalidReason::MalformedPayload {
                    tag,
                    message: e.to_string(),
                },
            )
        }
    };

    match payload.check() {
        Ok(()) => Classification::Valid(wrap(payload)),
        Err(Fault::Empty(field)) => {
            Classification::Invalid(InvalidReason::EmptyPayload {
                tag,
                field,
            })
        }
        Err(Fault::UnsafeUrl(field)) => {
            Classification::Invalid(InvalidReason::UnsafeUrl { tag, field })
        }
    }
}

/// Classifies one module.
///
/// Every module maps to exactly one outcome. This function never panics
/// and has no side effects; logging skipped modules is left to callers.
///
/// # Examples
///
/// ```
/// use moduleflow::classify::{classify, Classification};
/// use moduleflow::module::{RawModule, VariantTag};
/// use serde_json::json;
///
/// let empty = RawModule::new(json!({ "type": "testimonials", "testimonials": [] }));
/// assert!(!classify(&empty).is_valid());
///
/// let one = RawModule::new(json!({
///     "type": "testimonials",
///     "testimonials": [{ "author_name": "Ada", "content": "Great." }]
/// }));
/// assert_eq!(classify(&one).tag(), Some(VariantTag::Testimonials));
/// ```
pub fn classify(module: &RawModule) -> Classification {
    let Some(name) = module.type_name() else {
        return Classification::Invalid(InvalidReason::MissingType);
    };
    let Some(tag) = VariantTag::parse(name) else {
        return Classification::Invalid(InvalidReason::UnknownType(
            name.to_string(),
        ));
    };

    match tag {
        VariantTag::Hero => narrow(module, tag, Variant::Hero),
        VariantTag::Cta => narrow(module, tag, Variant::Cta),
        VariantTag::SellingPoints => {
            narrow(module, tag, Variant::SellingPoints)
        }
        VariantTag::Testimonials => {
            narrow(module, tag, Variant::Testimonials)
        }
        VariantTag::FeaturedPosts => {
            narrow(module, tag, Variant::FeaturedPosts)
        }
        VariantTag::Stats => narrow(module, tag, Variant::Stats),
        VariantTag::Gallery => narrow(module, tag, Variant::Gallery),
        VariantTag::Text => narrow(module, tag, Variant::Text),
        VariantTag::Form => narrow(module, tag, Variant::Form),
        VariantTag::Accordion => narrow(module, tag, Variant::Accordion),
        VariantTag::Tabs => narrow(module, tag, Variant::Tabs),
        VariantTag::Video => narrow(module, tag, Variant::Video),
        VariantTag::Chart => narrow(module, tag, Variant::Chart),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module(value: serde_json::Value) -> RawModule {
        RawModule::new(value)
    }

    #[test]
    fn test_testimonials_require_at_least_one_entry() {
        let empty = module(json!({
            "id": 1,
            "type": "testimonials",
            "testimonials": []
        }));
        assert_eq!(
            classify(&empty),
            Classification::Invalid(InvalidReason::EmptyPayload {
                tag: VariantTag::Testimonials,
                field: "testimonials",
            })
        );

        let one = module(json!({
            "id": 1,
            "type": "testimonials",
            "testimonials": [
                { "author_name": "Ada", "content": "Lovely work." }
            ]
        }));
        assert_eq!(classify(&one).tag(), Some(VariantTag::Testimonials));
    }

    #[test]
    fn test_missing_list_counts_as_empty() {
        let stats = module(json!({ "type": "stats" }));
        assert!(matches!(
            classify(&stats),
            Classification::Invalid(InvalidReason::EmptyPayload {
                field: "stats",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_and_missing_types() {
        let future = module(json!({ "type": "unsupported-future-type" }));
        assert_eq!(
            classify(&future),
            Classification::Invalid(InvalidReason::UnknownType(
                "unsupported-future-type".to_string()
            ))
        );

        let untyped = module(json!({ "id": 9 }));
        assert_eq!(
            classify(&untyped),
            Classification::Invalid(InvalidReason::MissingType)
        );

        let not_a_string = module(json!({ "type": 7 }));
        assert_eq!(
            classify(&not_a_string),
            Classification::Invalid(InvalidReason::MissingType)
        );

        let not_an_object = module(json!([1, 2, 3]));
        assert!(!classify(&not_an_object).is_valid());
    }

    #[test]
    fn test_discriminant_is_authoritative() {
        // Carries a valid testimonials list but is declared as selling points.
        let ambiguous = module(json!({
            "type": "selling-points",
            "points": [{ "title": "Fast" }],
            "testimonials": [{ "author_name": "Ada", "content": "Yes." }]
        }));
        assert_eq!(
            classify(&ambiguous).tag(),
            Some(VariantTag::SellingPoints)
        );

        let mislabeled = module(json!({
            "type": "selling-points",
            "testimonials": [{ "author_name": "Ada", "content": "Yes." }]
        }));
        assert!(!classify(&mislabeled).is_valid());
    }

    #[test]
    fn test_hero_requires_title() {
        let untitled = module(json!({ "type": "hero" }));
        assert!(matches!(
            classify(&untitled),
            Classification::Invalid(InvalidReason::MalformedPayload {
                tag: VariantTag::Hero,
                ..
            })
        ));

        let blank = module(json!({ "type": "hero", "title": "   " }));
        assert!(matches!(
            classify(&blank),
            Classification::Invalid(InvalidReason::EmptyPayload {
                field: "title",
                ..
            })
        ));

        let hero = module(json!({ "type": "hero", "title": "Welcome" }));
        assert_eq!(classify(&hero).tag(), Some(VariantTag::Hero));
    }

    #[test]
    fn test_unsafe_urls_invalidate_the_payload() {
        let cta = module(json!({
            "type": "cta",
            "title": "Sign up",
            "button": { "label": "Go", "url": "javascript:alert(1)" }
        }));
        assert_eq!(
            classify(&cta),
            Classification::Invalid(InvalidReason::UnsafeUrl {
                tag: VariantTag::Cta,
                field: "button",
            })
        );

        let video = module(json!({
            "type": "video",
            "url": "https://video.example.com/embed/1"
        }));
        assert!(classify(&video).is_valid());
    }

    #[test]
    fn test_every_known_type_has_a_valid_shape() {
        let samples = [
            json!({ "type": "hero", "title": "Hi" }),
            json!({ "type": "cta", "title": "Join", "button": { "label": "Go", "url": "/join" } }),
            json!({ "type": "selling-points", "points": [{ "title": "Fast" }] }),
            json!({ "type": "testimonials", "testimonials": [{ "author_name": "A", "content": "B" }] }),
            json!({ "type": "featured-posts", "posts": [{ "title": "T", "slug": "t" }] }),
            json!({ "type": "stats", "stats": [{ "value": 99, "label": "Uptime" }] }),
            json!({ "type": "gallery", "images": [{ "url": "/a.png" }] }),
            json!({ "type": "text", "body": "Hello" }),
            json!({ "type": "form", "fields": [{ "name": "email", "label": "Email" }] }),
            json!({ "type": "accordion", "items": [{ "title": "Q", "content": "A" }] }),
            json!({ "type": "tabs", "tabs": [{ "title": "One", "content": "1" }] }),
            json!({ "type": "video", "url": "https://example.com/v" }),
            json!({ "type": "chart", "series": [{ "label": "a", "value": 1 }] }),
        ];
        let tags: Vec<_> = samples
            .into_iter()
            .map(|value| classify(&module(value)).tag())
            .collect();
        let expected: Vec<_> =
            VariantTag::ALL.into_iter().map(Some).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn test_stat_values_accept_numbers_and_text() {
        let stats = module(json!({
            "type": "stats",
            "stats": [
                { "value": 150, "label": "Clients" },
                { "value": "24/7", "label": "Support" }
            ]
        }));
        assert!(classify(&stats).is_valid());
    }
}
