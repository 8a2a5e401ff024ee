// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Layout Composition
//!
//! Arranges grouped buckets into a [`PageSkeleton`]: header on top, the
//! main/sidebar content row, the `other` bucket below it, and the footer
//! last. Each region carries a [`BucketLayout`] expressed as a relative
//! proportion or a caller-chosen class, never as styling.
//!
//! Empty buckets produce no region at all.
//!
//! ## Example
//!
//! ```
//! use moduleflow::layout::{compose, BucketLayout, LayoutOverrides};
//! use moduleflow::module::{Placement, RawModule};
//! use moduleflow::section::group;
//! use serde_json::json;
//!
//! let modules = vec![
//!     RawModule::new(json!({ "id": 1, "placement": "main" })),
//!     RawModule::new(json!({ "id": 2, "placement": "sidebar" })),
//! ];
//! let overrides = LayoutOverrides::new().with("sidebar", "custom-class");
//! let skeleton = compose(group(&modules), &overrides);
//!
//! let sidebar = skeleton.region(Placement::Sidebar).unwrap();
//! assert_eq!(sidebar.layout, BucketLayout::Class("custom-class".to_string()));
//! assert!(skeleton.region(Placement::Header).is_none());
//! ```

use crate::module::{Placement, RawModule};
use crate::section::Buckets;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// The layout weight of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketLayout {
    /// Spans the full page width.
    FullWidth,
    /// Takes `parts` out of `of` equal columns of its row.
    Share {
        /// Columns taken.
        parts: u8,
        /// Columns in the row.
        of: u8,
    },
    /// A caller-supplied class name, used verbatim.
    Class(String),
}

impl BucketLayout {
    /// Parses a layout string.
    ///
    /// `"full"` is full width, `"N/M"` with `0 < N <= M` is a share, and
    /// any other value is taken as a class name.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("full") {
            return BucketLayout::FullWidth;
        }
        if let Some((parts, of)) = trimmed.split_once('/') {
            if let (Ok(parts), Ok(of)) =
                (parts.trim().parse::<u8>(), of.trim().parse::<u8>())
            {
                if parts > 0 && parts <= of {
                    return BucketLayout::Share { parts, of };
                }
            }
        }
        BucketLayout::Class(trimmed.to_string())
    }
}

impl fmt::Display for BucketLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLayout::FullWidth => f.write_str("full"),
            BucketLayout::Share { parts, of } => {
                write!(f, "{}/{}", parts, of)
            }
            BucketLayout::Class(class) => f.write_str(class),
        }
    }
}

impl Serialize for BucketLayout {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BucketLayout {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(BucketLayout::parse(&value))
    }
}

/// Layout of every bucket when nothing overrides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDefaults {
    layouts: [BucketLayout; 5],
}

impl Default for LayoutDefaults {
    /// Header, footer and `other` span the full width; main takes two
    /// thirds of the content row and the sidebar one third.
    fn default() -> Self {
        Self {
            layouts: [
                BucketLayout::FullWidth,
                BucketLayout::Share { parts: 2, of: 3 },
                BucketLayout::Share { parts: 1, of: 3 },
                BucketLayout::FullWidth,
                BucketLayout::FullWidth,
            ],
        }
    }
}

impl LayoutDefaults {
    /// Returns the default layout of a bucket.
    pub fn get(&self, placement: Placement) -> &BucketLayout {
        &self.layouts[placement.index()]
    }

    /// Returns these defaults with `overrides` applied.
    ///
    /// Each overridden bucket's layout is replaced wholesale.
    pub fn merged(&self, overrides: &LayoutOverrides) -> Self {
        let mut merged = self.clone();
        for (placement, layout) in &overrides.entries {
            merged.layouts[placement.index()] = layout.clone();
        }
        merged
    }
}

/// Caller-supplied layout replacements, keyed by bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOverrides {
    entries: HashMap<Placement, BucketLayout>,
}

impl LayoutOverrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override by bucket name.
    ///
    /// Names outside the five known buckets and blank layouts are ignored.
    pub fn with<V: AsRef<str>>(mut self, bucket: &str, layout: V) -> Self {
        if layout.as_ref().trim().is_empty() {
            debug!("Ignoring blank layout override for bucket '{}'", bucket);
            return self;
        }
        match Placement::from_name(bucket) {
            Some(placement) => {
                _ = self
                    .entries
                    .insert(placement, BucketLayout::parse(layout.as_ref()));
            }
            None => {
                debug!("Ignoring layout override for unknown bucket '{}'", bucket);
            }
        }
        self
    }

    /// Builds overrides from a string map, ignoring unknown bucket names.
    ///
    /// When a bucket is named both canonically and by an alias
    /// (`sidebar` and `aside`), the canonical name wins whatever the
    /// map's iteration order.
    pub fn from_map<K, V>(map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (canonical, aliases): (Vec<_>, Vec<_>) = map
            .into_iter()
            .partition(|(bucket, _)| is_canonical_name(bucket.as_ref()));
        aliases
            .into_iter()
            .chain(canonical)
            .fold(Self::new(), |overrides, (bucket, layout)| {
                overrides.with(bucket.as_ref(), layout)
            })
    }

    /// Returns these overrides with every entry of `other` layered on top.
    pub fn layered(mut self, other: &LayoutOverrides) -> Self {
        for (placement, layout) in &other.entries {
            _ = self.entries.insert(*placement, layout.clone());
        }
        self
    }

    /// Returns the override for a bucket, if any.
    pub fn get(&self, placement: Placement) -> Option<&BucketLayout> {
        self.entries.get(&placement)
    }

    /// Whether no bucket is overridden.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_canonical_name(bucket: &str) -> bool {
    Placement::from_name(bucket).is_some_and(|placement| {
        bucket.trim().eq_ignore_ascii_case(placement.as_str())
    })
}

/// One non-empty bucket of a composed page.
#[derive(Debug, Clone, PartialEq)]
pub struct Region<T> {
    /// The bucket this region renders.
    pub placement: Placement,
    /// The bucket's layout weight.
    pub layout: BucketLayout,
    /// The bucket's contents, in grouping order.
    pub items: Vec<T>,
}

/// The composed arrangement of a page.
///
/// Regions are held in presentation order: header, main, sidebar, other,
/// footer. Only non-empty buckets have a region.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSkeleton<T> {
    regions: Vec<Region<T>>,
}

/// Presentation order of the regions.
pub const PRESENTATION_ORDER: [Placement; 5] = [
    Placement::Header,
    Placement::Main,
    Placement::Sidebar,
    Placement::Other,
    Placement::Footer,
];

impl<T> PageSkeleton<T> {
    /// Returns the regions in presentation order.
    pub fn regions(&self) -> &[Region<T>] {
        &self.regions
    }

    /// Returns the region of a bucket, if that bucket is present.
    pub fn region(&self, placement: Placement) -> Option<&Region<T>> {
        self.regions
            .iter()
            .find(|region| region.placement == placement)
    }

    /// Whether the page has no regions at all.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether the main/sidebar content row has anything in it.
    pub fn has_content_row(&self) -> bool {
        self.region(Placement::Main).is_some()
            || self.region(Placement::Sidebar).is_some()
    }

    /// Total number of items across all regions.
    pub fn item_count(&self) -> usize {
        self.regions.iter().map(|region| region.items.len()).sum()
    }

    /// Transforms every item, keeping regions and their order.
    pub fn map<U, F>(self, mut f: F) -> PageSkeleton<U>
    where
        F: FnMut(Placement, T) -> U,
    {
        PageSkeleton {
            regions: self
                .regions
                .into_iter()
                .map(|region| {
                    let placement = region.placement;
                    Region {
                        placement,
                        layout: region.layout,
                        items: region
                            .items
                            .into_iter()
                            .map(|item| f(placement, item))
                            .collect(),
                    }
                })
                .collect(),
        }
    }

    /// Drops regions whose items were all removed.
    pub fn prune_empty(mut self) -> Self {
        self.regions.retain(|region| !region.items.is_empty());
        self
    }
}

impl<T> PageSkeleton<Option<T>> {
    /// Removes `None` items, then drops regions left empty.
    pub fn flatten(self) -> PageSkeleton<T> {
        PageSkeleton {
            regions: self
                .regions
                .into_iter()
                .map(|region| Region {
                    placement: region.placement,
                    layout: region.layout,
                    items: region.items.into_iter().flatten().collect(),
                })
                .collect(),
        }
        .prune_empty()
    }
}

/// Composes grouped buckets with the default layout and `overrides`.
pub fn compose<'a>(
    buckets: Buckets<'a>,
    overrides: &LayoutOverrides,
) -> PageSkeleton<&'a RawModule> {
    compose_with(buckets, &LayoutDefaults::default(), overrides)
}

/// Composes grouped buckets against explicit defaults.
///
/// Overrides replace a bucket's default wholesale. Buckets without
/// modules are omitted.
pub fn compose_with<'a>(
    buckets: Buckets<'a>,
    defaults: &LayoutDefaults,
    overrides: &LayoutOverrides,
) -> PageSkeleton<&'a RawModule> {
    let layouts = defaults.merged(overrides);
    let mut slots = buckets.into_slots();

    let regions = PRESENTATION_ORDER
        .into_iter()
        .filter_map(|placement| {
            let items = std::mem::take(&mut slots[placement.index()]);
            if items.is_empty() {
                None
            } else {
                Some(Region {
                    placement,
                    layout: layouts.get(placement).clone(),
                    items,
                })
            }
        })
        .collect();

    PageSkeleton { regions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::group;
    use serde_json::json;

    fn page() -> Vec<RawModule> {
        vec![
            RawModule::new(json!({ "id": 1, "placement": "footer" })),
            RawModule::new(json!({ "id": 2, "placement": "header" })),
            RawModule::new(json!({ "id": 3 })),
            RawModule::new(json!({ "id": 4, "placement": "somewhere" })),
            RawModule::new(json!({ "id": 5, "placement": "sidebar" })),
        ]
    }

    #[test]
    fn test_regions_follow_presentation_order() {
        let modules = page();
        let skeleton = compose(group(&modules), &LayoutOverrides::new());
        let order: Vec<_> =
            skeleton.regions().iter().map(|r| r.placement).collect();
        assert_eq!(order, PRESENTATION_ORDER.to_vec());
    }

    #[test]
    fn test_empty_sidebar_has_no_region() {
        let modules = vec![
            RawModule::new(json!({ "id": 1 })),
            RawModule::new(json!({ "id": 2, "placement": "footer" })),
        ];
        let skeleton = compose(group(&modules), &LayoutOverrides::new());

        assert!(skeleton.region(Placement::Sidebar).is_none());
        assert_eq!(skeleton.regions().len(), 2);
    }

    #[test]
    fn test_default_weights() {
        let modules = page();
        let skeleton = compose(group(&modules), &LayoutOverrides::new());

        let layout = |p| skeleton.region(p).map(|r| r.layout.clone());
        assert_eq!(layout(Placement::Header), Some(BucketLayout::FullWidth));
        assert_eq!(
            layout(Placement::Main),
            Some(BucketLayout::Share { parts: 2, of: 3 })
        );
        assert_eq!(
            layout(Placement::Sidebar),
            Some(BucketLayout::Share { parts: 1, of: 3 })
        );
        assert_eq!(layout(Placement::Other), Some(BucketLayout::FullWidth));
        assert_eq!(layout(Placement::Footer), Some(BucketLayout::FullWidth));
    }

    #[test]
    fn test_override_replaces_only_its_bucket() {
        let modules = page();
        let overrides = LayoutOverrides::new().with("sidebar", "custom-class");
        let skeleton = compose(group(&modules), &overrides);
        let defaults = LayoutDefaults::default();

        for region in skeleton.regions() {
            if region.placement == Placement::Sidebar {
                assert_eq!(
                    region.layout,
                    BucketLayout::Class("custom-class".to_string())
                );
            } else {
                assert_eq!(&region.layout, defaults.get(region.placement));
            }
        }
    }

    #[test]
    fn test_unknown_override_keys_are_ignored() {
        let overrides = LayoutOverrides::from_map([
            ("hero", "wide"),
            ("main", "3/4"),
        ]);
        assert_eq!(
            overrides.get(Placement::Main),
            Some(&BucketLayout::Share { parts: 3, of: 4 })
        );
        let merged = LayoutDefaults::default().merged(&overrides);
        assert_eq!(merged.get(Placement::Header), &BucketLayout::FullWidth);
    }

    #[test]
    fn test_canonical_bucket_name_beats_alias() {
        for _ in 0..64 {
            let map: HashMap<String, String> = [
                ("aside".to_string(), "b".to_string()),
                ("sidebar".to_string(), "a".to_string()),
            ]
            .into_iter()
            .collect();
            let overrides = LayoutOverrides::from_map(&map);
            assert_eq!(
                overrides.get(Placement::Sidebar),
                Some(&BucketLayout::Class("a".to_string()))
            );
        }

        let alias_only = LayoutOverrides::from_map([("Aside", "1/4")]);
        assert_eq!(
            alias_only.get(Placement::Sidebar),
            Some(&BucketLayout::Share { parts: 1, of: 4 })
        );
    }

    #[test]
    fn test_blank_override_keeps_default() {
        let overrides = LayoutOverrides::from_map([("sidebar", ""), ("main", "  ")]);
        assert!(overrides.is_empty());

        let modules = page();
        let skeleton = compose(group(&modules), &overrides);
        assert_eq!(
            skeleton.region(Placement::Sidebar).map(|r| r.layout.clone()),
            Some(BucketLayout::Share { parts: 1, of: 3 })
        );
    }

    #[test]
    fn test_layered_overrides_prefer_the_top_layer() {
        let configured = LayoutOverrides::new()
            .with("main", "full")
            .with("sidebar", "narrow");
        let caller = LayoutOverrides::new().with("sidebar", "wide");
        let layered = configured.layered(&caller);

        assert_eq!(layered.get(Placement::Main), Some(&BucketLayout::FullWidth));
        assert_eq!(
            layered.get(Placement::Sidebar),
            Some(&BucketLayout::Class("wide".to_string()))
        );
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!(BucketLayout::parse("FULL"), BucketLayout::FullWidth);
        assert_eq!(
            BucketLayout::parse(" 1 / 4 "),
            BucketLayout::Share { parts: 1, of: 4 }
        );
        assert_eq!(
            BucketLayout::parse("5/4"),
            BucketLayout::Class("5/4".to_string())
        );
        assert_eq!(
            BucketLayout::parse("0/3"),
            BucketLayout::Class("0/3".to_string())
        );
    }

    #[test]
    fn test_empty_page_composes_to_empty_skeleton() {
        let skeleton = compose(group(&[]), &LayoutOverrides::new());
        assert!(skeleton.is_empty());
        assert!(!skeleton.has_content_row());
    }

    #[test]
    fn test_composition_is_deterministic() {
        let modules = page();
        let overrides = LayoutOverrides::new().with("main", "3/4");
        let first = compose(group(&modules), &overrides);
        let second = compose(group(&modules), &overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flatten_drops_regions_left_empty() {
        let modules = page();
        let skeleton = compose(group(&modules), &LayoutOverrides::new())
            .map(|placement, module| {
                (placement != Placement::Header).then(|| module.id_label())
            })
            .flatten();

        assert!(skeleton.region(Placement::Header).is_none());
        assert_eq!(skeleton.item_count(), 4);
    }
}
