//! # Section Grouping
//!
//! Partitions a page's ordered module list into the five placement
//! buckets. Grouping is a stable partition: modules keep their input
//! order within a bucket, every module lands in exactly one bucket, and
//! all five buckets are always present (possibly empty).

use crate::module::{Placement, RawModule};
use log::debug;

/// The five placement buckets of a page, each an ordered module sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets<'a> {
    slots: [Vec<&'a RawModule>; 5],
}

impl<'a> Buckets<'a> {
    /// Returns the modules grouped under `placement`, in input order.
    pub fn get(&self, placement: Placement) -> &[&'a RawModule] {
        &self.slots[placement.index()]
    }

    /// Iterates over all five buckets in [`Placement::ALL`] order,
    /// empty buckets included.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (Placement, &[&'a RawModule])> + '_ {
        Placement::ALL
            .into_iter()
            .map(move |placement| (placement, self.get(placement)))
    }

    /// Total number of modules across all buckets.
    pub fn total(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Whether every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Stably sorts each bucket by the modules' `order` field.
    ///
    /// Modules sharing an `order` value keep their input order.
    pub fn sort_by_order(mut self) -> Self {
        for slot in &mut self.slots {
            slot.sort_by_key(|module| module.order());
        }
        self
    }

    pub(crate) fn into_slots(self) -> [Vec<&'a RawModule>; 5] {
        self.slots
    }
}

/// Groups modules by placement, preserving input order within each bucket.
///
/// The `order` field is not consulted; see [`Buckets::sort_by_order`].
///
/// # Examples
///
/// ```
/// use moduleflow::module::{Placement, RawModule};
/// use moduleflow::section::group;
/// use serde_json::json;
///
/// let modules = vec![
///     RawModule::new(json!({ "id": "a", "placement": "main", "order": 9 })),
///     RawModule::new(json!({ "id": "b", "placement": "sidebar" })),
///     RawModule::new(json!({ "id": "c", "placement": "main", "order": 1 })),
/// ];
/// let buckets = group(&modules);
/// let main: Vec<_> = buckets.get(Placement::Main).iter().map(|m| m.id_label()).collect();
/// assert_eq!(main, ["a", "c"]);
/// assert_eq!(buckets.get(Placement::Sidebar).len(), 1);
/// ```
pub fn group(modules: &[RawModule]) -> Buckets<'_> {
    let mut buckets = Buckets::default();
    for module in modules {
        let placement = module.placement();
        buckets.slots[placement.index()].push(module);
    }
    debug!(
        "Grouped {} modules (header {}, main {}, sidebar {}, footer {}, other {})",
        modules.len(),
        buckets.get(Placement::Header).len(),
        buckets.get(Placement::Main).len(),
        buckets.get(Placement::Sidebar).len(),
        buckets.get(Placement::Footer).len(),
        buckets.get(Placement::Other).len(),
    );
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(modules: &[&RawModule]) -> Vec<String> {
        modules.iter().map(|module| module.id_label()).collect()
    }

    #[test]
    fn test_grouping_preserves_input_order() {
        let modules = vec![
            RawModule::new(json!({ "id": "A", "placement": "main", "order": 5 })),
            RawModule::new(json!({ "id": "B", "placement": "sidebar" })),
            RawModule::new(json!({ "id": "C", "placement": "main", "order": 1 })),
        ];
        let buckets = group(&modules);

        assert_eq!(ids(buckets.get(Placement::Main)), ["A", "C"]);
        assert_eq!(ids(buckets.get(Placement::Sidebar)), ["B"]);
    }

    #[test]
    fn test_grouping_is_complete() {
        let modules: Vec<RawModule> = [
            json!({ "placement": "header" }),
            json!({ "placement": "footer" }),
            json!({ "placement": "nowhere" }),
            json!({}),
            json!(null),
            json!({ "placement": ["main"] }),
            json!({ "type": "unsupported-future-type", "placement": "sidebar" }),
        ]
        .into_iter()
        .map(RawModule::new)
        .collect();

        let buckets = group(&modules);
        assert_eq!(buckets.total(), modules.len());
        assert_eq!(buckets.get(Placement::Other).len(), 2);
        assert_eq!(buckets.get(Placement::Main).len(), 2);
    }

    #[test]
    fn test_empty_buckets_are_present() {
        let modules = vec![RawModule::new(json!({ "id": 1 }))];
        let buckets = group(&modules);

        let listed: Vec<_> = buckets.iter().map(|(p, _)| p).collect();
        assert_eq!(listed, Placement::ALL.to_vec());
        assert!(buckets.get(Placement::Sidebar).is_empty());
    }

    #[test]
    fn test_empty_page_groups_to_empty_buckets() {
        let buckets = group(&[]);
        assert!(buckets.is_empty());
        assert_eq!(buckets.iter().count(), 5);
    }

    #[test]
    fn test_sort_by_order_is_stable() {
        let modules = vec![
            RawModule::new(json!({ "id": "x", "order": 2 })),
            RawModule::new(json!({ "id": "y", "order": 1 })),
            RawModule::new(json!({ "id": "z", "order": 2 })),
            RawModule::new(json!({ "id": "w" })),
        ];
        let buckets = group(&modules).sort_by_order();
        assert_eq!(ids(buckets.get(Placement::Main)), ["w", "y", "x", "z"]);
    }
}
