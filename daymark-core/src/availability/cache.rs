//! In-memory availability store for one session.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::availability::snapshot::AvailabilitySnapshot;
use crate::month::{DayStamp, MonthKey};
use crate::namespace::NamespaceKey;

/// Availability snapshots keyed by month. Cheap to clone; clones share state.
///
/// [`AvailabilityCache::replace`] is the only way to change a month's data,
/// and each change bumps a revision observers can wait on.
#[derive(Clone)]
pub struct AvailabilityCache {
    months: Arc<RwLock<HashMap<MonthKey, Arc<AvailabilitySnapshot>>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        AvailabilityCache {
            months: Arc::new(RwLock::new(HashMap::new())),
            revision: Arc::new(revision),
        }
    }

    /// Swap in a new snapshot for `month`.
    pub fn replace(&self, month: MonthKey, snapshot: AvailabilitySnapshot) {
        self.months
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(month, Arc::new(snapshot));
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub fn get(&self, month: MonthKey) -> Option<Arc<AvailabilitySnapshot>> {
        self.months
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&month)
            .cloned()
    }

    /// Days with data for `namespace` in `month`; empty when unknown.
    pub fn days(&self, month: MonthKey, namespace: &NamespaceKey) -> BTreeSet<DayStamp> {
        self.get(month)
            .map(|snapshot| snapshot.days(namespace).clone())
            .unwrap_or_default()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn clear(&self) {
        self.months
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new()
    }
}
