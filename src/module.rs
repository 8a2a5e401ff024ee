// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Module Model
//!
//! The schema every other part of the pipeline relies on: the raw,
//! untrusted record received from the CMS ([`RawModule`]), the placement
//! buckets a module can be laid out in ([`Placement`]), and the closed set
//! of content variants with one payload shape per discriminant
//! ([`Variant`], [`VariantTag`]).
//!
//! Payload structs only describe shape. Whether a payload is a *valid*
//! instance of its variant (required lists non-empty, URLs safe) is decided
//! by the classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Identifier of a module, stable across requests.
///
/// The CMS may send either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleId {
    /// Numeric identifier.
    Int(i64),
    /// Textual identifier (slug, UUID, ...).
    Text(String),
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleId::Int(id) => write!(f, "{}", id),
            ModuleId::Text(id) => f.write_str(id),
        }
    }
}

/// The named placement bucket a module is laid out in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Full-width area above the content row.
    Header,
    /// Dominant column of the content row.
    Main,
    /// Minority column of the content row.
    Sidebar,
    /// Full-width area closing the page.
    Footer,
    /// Full-width area below the content row, for unrecognized placements.
    Other,
}

impl Placement {
    /// Every placement, in bucket order.
    pub const ALL: [Placement; 5] = [
        Placement::Header,
        Placement::Main,
        Placement::Sidebar,
        Placement::Footer,
        Placement::Other,
    ];

    /// Returns the bucket name used in module records and overrides.
    pub fn as_str(self) -> &'static str {
        match self {
            Placement::Header => "header",
            Placement::Main => "main",
            Placement::Sidebar => "sidebar",
            Placement::Footer => "footer",
            Placement::Other => "other",
        }
    }

    /// Parses a bucket name. Returns `None` for names outside the five
    /// known buckets.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "header" => Some(Placement::Header),
            "main" => Some(Placement::Main),
            "sidebar" | "aside" => Some(Placement::Sidebar),
            "footer" => Some(Placement::Footer),
            "other" => Some(Placement::Other),
            _ => None,
        }
    }

    /// Resolves the placement declared by a module record.
    ///
    /// An absent placement means `Main`. A declared but unrecognized value
    /// (including non-string values) lands in `Other`.
    pub fn resolve(declared: Option<&JsonValue>) -> Self {
        match declared {
            None | Some(JsonValue::Null) => Placement::Main,
            Some(JsonValue::String(name)) => {
                Self::from_name(name).unwrap_or(Placement::Other)
            }
            Some(_) => Placement::Other,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Placement::Header => 0,
            Placement::Main => 1,
            Placement::Sidebar => 2,
            Placement::Footer => 3,
            Placement::Other => 4,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module record exactly as received from the CMS.
///
/// The wrapper never fails to deserialize. Records that are not JSON
/// objects are kept so that grouping stays complete; they classify as
/// invalid later on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawModule(JsonValue);

impl RawModule {
    /// Wraps a loosely-typed record.
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Returns the underlying record.
    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    /// Returns a single field of the record, if present.
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    /// Returns the module identifier, if the record carries a usable one.
    pub fn id(&self) -> Option<ModuleId> {
        match self.field("id")? {
            JsonValue::Number(n) => n.as_i64().map(ModuleId::Int),
            JsonValue::String(s) => Some(ModuleId::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns the identifier for logs and diagnostics, `?` if missing.
    pub fn id_label(&self) -> String {
        self.id().map_or_else(|| "?".to_string(), |id| id.to_string())
    }

    /// Returns the discriminant string.
    pub fn type_name(&self) -> Option<&str> {
        self.field("type").and_then(JsonValue::as_str)
    }

    /// Returns the module title, if present.
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(JsonValue::as_str)
    }

    /// Returns the display order among siblings, `0` when absent.
    pub fn order(&self) -> i64 {
        self.field("order").and_then(JsonValue::as_i64).unwrap_or(0)
    }

    /// Returns the placement bucket this module belongs to.
    pub fn placement(&self) -> Placement {
        Placement::resolve(self.field("placement"))
    }

    /// Whether the module is only shown to authenticated viewers.
    pub fn is_gated(&self) -> bool {
        self.field("requires_auth")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Builds a module list from a page document.
    ///
    /// Accepts either an array of records or a page record with a
    /// `modules` array. Returns `None` for any other shape.
    pub fn list_from_value(document: JsonValue) -> Option<Vec<Self>> {
        let items = match document {
            JsonValue::Array(items) => items,
            JsonValue::Object(mut page) => match page.remove("modules") {
                Some(JsonValue::Array(items)) => items,
                _ => return None,
            },
            _ => return None,
        };
        Some(items.into_iter().map(RawModule::new).collect())
    }
}

impl From<JsonValue> for RawModule {
    fn from(value: JsonValue) -> Self {
        Self::new(value)
    }
}

/// The discriminant identifying a content variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantTag {
    /// `hero`
    Hero,
    /// `cta`
    Cta,
    /// `selling-points`
    SellingPoints,
    /// `testimonials`
    Testimonials,
    /// `featured-posts`
    FeaturedPosts,
    /// `stats`
    Stats,
    /// `gallery`
    Gallery,
    /// `text`
    Text,
    /// `form`
    Form,
    /// `accordion`
    Accordion,
    /// `tabs`
    Tabs,
    /// `video`
    Video,
    /// `chart`
    Chart,
}

impl VariantTag {
    /// Every known discriminant.
    pub const ALL: [VariantTag; 13] = [
        VariantTag::Hero,
        VariantTag::Cta,
        VariantTag::SellingPoints,
        VariantTag::Testimonials,
        VariantTag::FeaturedPosts,
        VariantTag::Stats,
        VariantTag::Gallery,
        VariantTag::Text,
        VariantTag::Form,
        VariantTag::Accordion,
        VariantTag::Tabs,
        VariantTag::Video,
        VariantTag::Chart,
    ];

    /// Returns the discriminant string as sent by the CMS.
    pub fn as_str(self) -> &'static str {
        match self {
            VariantTag::Hero => "hero",
            VariantTag::Cta => "cta",
            VariantTag::SellingPoints => "selling-points",
            VariantTag::Testimonials => "testimonials",
            VariantTag::FeaturedPosts => "featured-posts",
            VariantTag::Stats => "stats",
            VariantTag::Gallery => "gallery",
            VariantTag::Text => "text",
            VariantTag::Form => "form",
            VariantTag::Accordion => "accordion",
            VariantTag::Tabs => "tabs",
            VariantTag::Video => "video",
            VariantTag::Chart => "chart",
        }
    }

    /// Exact-match lookup of a discriminant string.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link with a visible label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Visible text.
    pub label: String,
    /// Target URL.
    pub url: String,
}

/// An image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alternative text.
    #[serde(default)]
    pub alt: Option<String>,
    /// Optional caption shown under the image.
    #[serde(default)]
    pub caption: Option<String>,
}

/// Payload of a `hero` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    /// Headline, required.
    pub title: String,
    /// Supporting line.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Background image.
    #[serde(default)]
    pub background_image: Option<Image>,
    /// Primary call to action.
    #[serde(default)]
    pub cta: Option<Link>,
}

/// Payload of a `cta` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    /// Headline, required.
    pub title: String,
    /// Supporting copy.
    #[serde(default)]
    pub description: Option<String>,
    /// The button, required.
    pub button: Link,
}

/// One entry of a `selling-points` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingPoint {
    /// Short heading.
    pub title: String,
    /// Explanation.
    #[serde(default)]
    pub description: Option<String>,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Payload of a `selling-points` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingPoints {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The points, must not be empty.
    #[serde(default)]
    pub points: Vec<SellingPoint>,
}

/// One testimonial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    /// Who said it.
    pub author_name: String,
    /// What they said.
    pub content: String,
    /// Portrait of the author.
    #[serde(default)]
    pub author_image: Option<Image>,
    /// Role or company of the author.
    #[serde(default)]
    pub author_position: Option<String>,
}

/// Payload of a `testimonials` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonials {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The testimonials, must not be empty.
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
}

/// Summary of a post shown by `featured-posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Post title.
    pub title: String,
    /// Post slug, used to build the link.
    pub slug: String,
    /// Teaser text.
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Cover image.
    #[serde(default)]
    pub image: Option<Image>,
}

/// Payload of a `featured-posts` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedPosts {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The posts, must not be empty.
    #[serde(default)]
    pub posts: Vec<PostSummary>,
}

/// The value of a stat, numeric or preformatted text (`"24/7"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    /// A plain number, kept exactly as sent.
    Number(serde_json::Number),
    /// Preformatted text.
    Text(String),
}

/// One stat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    /// The figure.
    pub value: StatValue,
    /// What the figure measures.
    pub label: String,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Payload of a `stats` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The stats, must not be empty.
    #[serde(default)]
    pub stats: Vec<Stat>,
}

/// Payload of a `gallery` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The images, must not be empty.
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Payload of a `text` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// Markdown body, must not be blank.
    #[serde(default)]
    pub body: String,
}

/// One input of a `form` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Submitted field name.
    pub name: String,
    /// Visible label.
    pub label: String,
    /// HTML input type.
    #[serde(default = "default_field_kind")]
    pub kind: String,
    /// Whether the field must be filled in.
    #[serde(default)]
    pub required: bool,
}

/// Payload of a `form` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The inputs, must not be empty.
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Label of the submit button.
    #[serde(default)]
    pub submit_label: Option<String>,
    /// Form action URL.
    #[serde(default)]
    pub action: Option<String>,
}

/// A titled panel, shared by `accordion` and `tabs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// Panel heading or tab label.
    pub title: String,
    /// Panel body.
    pub content: String,
}

/// Payload of an `accordion` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accordion {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The panels, must not be empty.
    #[serde(default)]
    pub items: Vec<Panel>,
}

/// Payload of a `tabs` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tabs {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// The tabs, must not be empty.
    #[serde(default)]
    pub tabs: Vec<Panel>,
}

/// Payload of a `video` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// Embed URL, required.
    #[serde(default)]
    pub url: String,
    /// Caption.
    #[serde(default)]
    pub caption: Option<String>,
}

/// One data point of a `chart` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Category label.
    pub label: String,
    /// Measured value.
    pub value: serde_json::Number,
}

/// Payload of a `chart` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Section heading.
    #[serde(default)]
    pub title: Option<String>,
    /// Chart style, `bar` by default.
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    /// The data points, must not be empty.
    #[serde(default)]
    pub series: Vec<ChartPoint>,
}

impl Chart {
    /// Returns each point's share of the largest absolute value, in
    /// whole percent, in series order.
    pub fn bar_percentages(&self) -> Vec<f64> {
        let values: Vec<f64> = self
            .series
            .iter()
            .map(|point| point.value.as_f64().unwrap_or(0.0).abs())
            .collect();
        let max = values.iter().copied().fold(0.0_f64, f64::max);
        values
            .into_iter()
            .map(|value| {
                if max > 0.0 {
                    (value / max * 100.0).round()
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// A module narrowed to exactly one known variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// `hero`
    Hero(Hero),
    /// `cta`
    Cta(Cta),
    /// `selling-points`
    SellingPoints(SellingPoints),
    /// `testimonials`
    Testimonials(Testimonials),
    /// `featured-posts`
    FeaturedPosts(FeaturedPosts),
    /// `stats`
    Stats(Stats),
    /// `gallery`
    Gallery(Gallery),
    /// `text`
    Text(Text),
    /// `form`
    Form(Form),
    /// `accordion`
    Accordion(Accordion),
    /// `tabs`
    Tabs(Tabs),
    /// `video`
    Video(Video),
    /// `chart`
    Chart(Chart),
}

impl Variant {
    /// Returns the discriminant of this variant.
    pub fn tag(&self) -> VariantTag {
        match self {
            Variant::Hero(_) => VariantTag::Hero,
            Variant::Cta(_) => VariantTag::Cta,
            Variant::SellingPoints(_) => VariantTag::SellingPoints,
            Variant::Testimonials(_) => VariantTag::Testimonials,
            Variant::FeaturedPosts(_) => VariantTag::FeaturedPosts,
            Variant::Stats(_) => VariantTag::Stats,
            Variant::Gallery(_) => VariantTag::Gallery,
            Variant::Text(_) => VariantTag::Text,
            Variant::Form(_) => VariantTag::Form,
            Variant::Accordion(_) => VariantTag::Accordion,
            Variant::Tabs(_) => VariantTag::Tabs,
            Variant::Video(_) => VariantTag::Video,
            Variant::Chart(_) => VariantTag::Chart,
        }
    }

    /// Serializes the payload for template rendering.
    pub fn to_json(&self) -> serde_json::Result<JsonValue> {
        match self {
            Variant::Hero(p) => serde_json::to_value(p),
            Variant::Cta(p) => serde_json::to_value(p),
            Variant::SellingPoints(p) => serde_json::to_value(p),
            Variant::Testimonials(p) => serde_json::to_value(p),
            Variant::FeaturedPosts(p) => serde_json::to_value(p),
            Variant::Stats(p) => serde_json::to_value(p),
            Variant::Gallery(p) => serde_json::to_value(p),
            Variant::Text(p) => serde_json::to_value(p),
            Variant::Form(p) => serde_json::to_value(p),
            Variant::Accordion(p) => serde_json::to_value(p),
            Variant::Tabs(p) => serde_json::to_value(p),
            Variant::Video(p) => serde_json::to_value(p),
            Variant::Chart(p) => serde_json::to_value(p),
        }
    }
}

fn default_field_kind() -> String {
    "text".to_string()
}

fn default_chart_type() -> String {
    "bar".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placement_defaults_to_main_when_absent() {
        let module = RawModule::new(json!({ "id": 1, "type": "hero" }));
        assert_eq!(module.placement(), Placement::Main);
    }

    #[test]
    fn test_unrecognized_placement_is_other() {
        let module = RawModule::new(json!({ "placement": "banner" }));
        assert_eq!(module.placement(), Placement::Other);

        let module = RawModule::new(json!({ "placement": 3 }));
        assert_eq!(module.placement(), Placement::Other);
    }

    #[test]
    fn test_placement_parsing_is_lenient() {
        assert_eq!(
            Placement::from_name(" Sidebar "),
            Some(Placement::Sidebar)
        );
        assert_eq!(Placement::from_name("aside"), Some(Placement::Sidebar));
        assert_eq!(Placement::from_name("hero"), None);
    }

    #[test]
    fn test_module_ids() {
        let numeric = RawModule::new(json!({ "id": 42 }));
        let textual = RawModule::new(json!({ "id": "intro" }));
        let missing = RawModule::new(json!({}));

        assert_eq!(numeric.id(), Some(ModuleId::Int(42)));
        assert_eq!(textual.id_label(), "intro");
        assert_eq!(missing.id_label(), "?");
    }

    #[test]
    fn test_non_object_record_is_kept() {
        let module = RawModule::new(json!("garbage"));
        assert_eq!(module.type_name(), None);
        assert_eq!(module.order(), 0);
        assert_eq!(module.placement(), Placement::Main);
        assert!(!module.is_gated());
    }

    #[test]
    fn test_list_from_page_record() {
        let page = json!({
            "slug": "home",
            "modules": [{ "id": 1 }, { "id": 2 }]
        });
        let modules = RawModule::list_from_value(page).unwrap();
        assert_eq!(modules.len(), 2);

        assert!(RawModule::list_from_value(json!({ "slug": "x" })).is_none());
        assert!(RawModule::list_from_value(json!(12)).is_none());
    }

    #[test]
    fn test_variant_tags_round_trip_their_names() {
        for tag in VariantTag::ALL {
            assert_eq!(VariantTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(VariantTag::parse("Hero"), None);
        assert_eq!(VariantTag::parse("unsupported-future-type"), None);
    }

    #[test]
    fn test_chart_bars_are_relative_to_the_maximum() {
        let chart = Chart {
            title: None,
            chart_type: "bar".to_string(),
            series: vec![
                ChartPoint {
                    label: "a".to_string(),
                    value: 50.into(),
                },
                ChartPoint {
                    label: "b".to_string(),
                    value: 200.into(),
                },
            ],
        };
        assert_eq!(chart.bar_percentages(), vec![25.0, 100.0]);
    }
}
