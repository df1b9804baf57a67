//! Ingestion progress reported by the backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::namespace::NamespaceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    #[serde(alias = "pending")]
    NotStarted,
    #[serde(alias = "running")]
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl SourceStatus {
    /// Finished one way or another; nothing more will arrive for it.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SourceStatus::Completed | SourceStatus::Failed | SourceStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProgress {
    pub status: SourceStatus,
    #[serde(default)]
    pub percent_complete: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full ingestion picture at one instant. Replaced wholesale, never merged
/// with an earlier snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub overall_complete: bool,
    #[serde(default)]
    pub overall_in_progress: bool,
    #[serde(default)]
    pub completed_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub in_progress_count: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub overall_percent: f32,
    pub sources: BTreeMap<NamespaceKey, SourceProgress>,
}

impl SyncSnapshot {
    pub fn source(&self, namespace: &NamespaceKey) -> Option<&SourceProgress> {
        self.sources.get(namespace)
    }

    /// Sources that reported a failure, with their error summary.
    pub fn failures(&self) -> impl Iterator<Item = (&NamespaceKey, Option<&str>)> {
        self.sources
            .iter()
            .filter(|(_, p)| p.status == SourceStatus::Failed)
            .map(|(k, p)| (k, p.error.as_deref()))
    }
}

/// What the tracker currently knows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncStatus {
    /// Nothing heard from the backend yet.
    #[default]
    Unknown,
    /// The backend answered without sync information. Not the same as
    /// complete.
    Untracked,
    Reported(Arc<SyncSnapshot>),
}

impl SyncStatus {
    pub fn snapshot(&self) -> Option<&SyncSnapshot> {
        match self {
            SyncStatus::Reported(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot().is_some_and(|s| s.overall_complete)
    }
}

/// Holder of the latest [`SyncStatus`]. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncStatusTracker {
    status: Arc<watch::Sender<SyncStatus>>,
}

impl SyncStatusTracker {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SyncStatus::Unknown);
        SyncStatusTracker {
            status: Arc::new(status),
        }
    }

    /// Replace the current status with `snapshot`.
    pub fn apply(&self, snapshot: SyncSnapshot) {
        tracing::debug!(
            complete = snapshot.overall_complete,
            percent = snapshot.overall_percent,
            sources = snapshot.sources.len(),
            "applying sync snapshot"
        );
        self.status
            .send_replace(SyncStatus::Reported(Arc::new(snapshot)));
    }

    /// Record that a response came without sync status. Only moves on from
    /// `Unknown`: a page lacking the field is not a status report, so a
    /// reported snapshot stays until the next one replaces it.
    pub fn mark_untracked(&self) {
        self.status.send_if_modified(|status| match status {
            SyncStatus::Unknown => {
                *status = SyncStatus::Untracked;
                true
            }
            SyncStatus::Untracked | SyncStatus::Reported(_) => false,
        });
    }

    pub fn current(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.status.borrow().is_complete()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }
}

impl Default for SyncStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
