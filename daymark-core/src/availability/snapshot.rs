//! Per-month availability snapshot.

use std::collections::{BTreeMap, BTreeSet};

use crate::month::DayStamp;
use crate::namespace::{NamespaceKey, NamespaceSet};

static NO_DAYS: BTreeSet<DayStamp> = BTreeSet::new();

/// Days with data per namespace for one month.
///
/// A snapshot is immutable once built and always contains the union
/// namespace, so readers never have to tell "missing" from "empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    days: BTreeMap<NamespaceKey, BTreeSet<DayStamp>>,
}

impl AvailabilitySnapshot {
    /// A snapshot where every namespace (union included) has no days.
    pub fn empty(namespaces: &NamespaceSet) -> Self {
        Self::from_days(BTreeMap::new(), namespaces)
    }

    /// Build a snapshot, materializing the union namespace and every
    /// configured namespace that the source left out.
    pub fn from_days(
        mut days: BTreeMap<NamespaceKey, BTreeSet<DayStamp>>,
        namespaces: &NamespaceSet,
    ) -> Self {
        for key in namespaces.all() {
            days.entry(key).or_default();
        }
        AvailabilitySnapshot { days }
    }

    /// Days for `namespace`; empty for namespaces the snapshot doesn't know.
    pub fn days(&self, namespace: &NamespaceKey) -> &BTreeSet<DayStamp> {
        self.days.get(namespace).unwrap_or(&NO_DAYS)
    }

    pub fn union(&self) -> &BTreeSet<DayStamp> {
        self.days(&NamespaceKey::union())
    }

    pub fn has_data(&self, namespace: &NamespaceKey, day: &DayStamp) -> bool {
        self.days(namespace).contains(day)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceKey> {
        self.days.keys()
    }

    /// True when no namespace has any day.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(BTreeSet::is_empty)
    }
}

impl Default for AvailabilitySnapshot {
    fn default() -> Self {
        Self::empty(&NamespaceSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_materializes_namespaces() {
        let snapshot = AvailabilitySnapshot::empty(&NamespaceSet::new(["news"]));
        let keys: Vec<&str> = snapshot.namespaces().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["all", "news"]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_unknown_namespace_reads_empty() {
        let snapshot = AvailabilitySnapshot::default();
        assert!(snapshot.days(&NamespaceKey::new("social")).is_empty());
        assert!(snapshot.union().is_empty());
    }
}
