//! Generation-stamped availability requests.
//!
//! Every fetch for the visible month gets a fresh [`FetchGeneration`] and
//! cancellation token. A result only reaches the cache or the sync tracker
//! if its generation is still the current one when it completes; the check
//! and the write happen under one lock, so completion order does not matter.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::availability::{
    AvailabilityCache, AvailabilityFetcher, AvailabilityPage, AvailabilitySnapshot, FetchResult,
    fetch_cancellable,
};
use crate::error::{DaymarkError, DaymarkResult, FetchError};
use crate::month::MonthKey;
use crate::namespace::NamespaceSet;
use crate::settings::RetryPolicy;
use crate::sync_status::SyncStatusTracker;

/// Token identifying one availability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FetchGeneration(u64);

impl FetchGeneration {
    fn next(self) -> Self {
        FetchGeneration(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Where the visible month's data stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
    Applied,
    FailedAndCleared,
}

/// What happened to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Finished after a newer request started; nothing was applied.
    Discarded,
    /// Failed while current; the month now shows no data.
    FailedAndCleared,
    /// Cancelled before finishing; nothing was applied.
    Cancelled,
}

/// Handle on a started request.
pub struct FetchTicket {
    pub generation: FetchGeneration,
    pub month: MonthKey,
    handle: JoinHandle<FetchOutcome>,
}

impl FetchTicket {
    pub async fn outcome(self) -> FetchOutcome {
        self.handle.await.unwrap_or(FetchOutcome::Cancelled)
    }
}

struct LifecycleState {
    generation: FetchGeneration,
    visible: Option<MonthKey>,
    cancel: Option<CancellationToken>,
    phase: FetchPhase,
    /// A progress refresh arrived while a fetch was in flight.
    refresh_pending: bool,
    closed: bool,
}

struct Shared {
    fetcher: Arc<dyn AvailabilityFetcher>,
    cache: AvailabilityCache,
    tracker: SyncStatusTracker,
    namespaces: NamespaceSet,
    retry: RetryPolicy,
    state: Mutex<LifecycleState>,
}

/// Owns "which request is current" for the visible month. Cheap to clone;
/// clones share state.
#[derive(Clone)]
pub struct RequestLifecycleController {
    shared: Arc<Shared>,
}

impl RequestLifecycleController {
    pub fn new(
        fetcher: Arc<dyn AvailabilityFetcher>,
        cache: AvailabilityCache,
        tracker: SyncStatusTracker,
        namespaces: NamespaceSet,
        retry: RetryPolicy,
    ) -> Self {
        RequestLifecycleController {
            shared: Arc::new(Shared {
                fetcher,
                cache,
                tracker,
                namespaces,
                retry,
                state: Mutex::new(LifecycleState {
                    generation: FetchGeneration::default(),
                    visible: None,
                    cancel: None,
                    phase: FetchPhase::Idle,
                    refresh_pending: false,
                    closed: false,
                }),
            }),
        }
    }

    /// Make `month` the visible month and fetch it, with retries.
    pub fn change_month(&self, month: MonthKey) -> DaymarkResult<FetchTicket> {
        self.begin(month, self.shared.retry)
    }

    /// Fetch the visible month again, without retries, superseding any
    /// fetch in flight. `None` before the first month change or after
    /// shutdown.
    pub fn refresh(&self) -> Option<FetchTicket> {
        let mut state = self.shared.lock();
        if state.closed {
            return None;
        }
        let month = state.visible?;
        Some(self.shared.begin(&mut state, month, RetryPolicy::none()))
    }

    /// Refresh on behalf of a progress notification. While a fetch for the
    /// visible month is in flight this only marks a follow-up, started once
    /// that fetch lands, so notifications arriving faster than a fetch takes
    /// collapse into one extra fetch instead of cancelling each other.
    pub fn request_refresh(&self) -> Option<FetchTicket> {
        let mut state = self.shared.lock();
        if state.closed {
            return None;
        }
        let month = state.visible?;
        if state.phase == FetchPhase::Fetching {
            state.refresh_pending = true;
            tracing::debug!(%month, "fetch in flight; deferring refresh");
            return None;
        }
        Some(self.shared.begin(&mut state, month, RetryPolicy::none()))
    }

    /// Cancel the in-flight request and refuse to apply anything from now on.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
    }

    pub fn visible_month(&self) -> Option<MonthKey> {
        let state = self.shared.lock();
        if state.closed { None } else { state.visible }
    }

    pub fn generation(&self) -> FetchGeneration {
        self.shared.lock().generation
    }

    pub fn phase(&self) -> FetchPhase {
        self.shared.lock().phase
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock().closed
    }

    fn begin(&self, month: MonthKey, retry: RetryPolicy) -> DaymarkResult<FetchTicket> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(DaymarkError::ShutDown);
        }
        Ok(self.shared.begin(&mut state, month, retry))
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the current fetch and start a new generation for `month`.
    /// Called with the state lock held.
    fn begin(
        self: &Arc<Self>,
        state: &mut LifecycleState,
        month: MonthKey,
        retry: RetryPolicy,
    ) -> FetchTicket {
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
        }
        state.generation = state.generation.next();
        state.visible = Some(month);
        state.phase = FetchPhase::Fetching;
        state.refresh_pending = false;
        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        let generation = state.generation;

        tracing::debug!(%month, generation = generation.value(), "starting availability fetch");

        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move { shared.run(generation, month, cancel, retry).await });

        FetchTicket {
            generation,
            month,
            handle,
        }
    }

    async fn run(
        self: Arc<Self>,
        generation: FetchGeneration,
        month: MonthKey,
        cancel: CancellationToken,
        retry: RetryPolicy,
    ) -> FetchOutcome {
        let mut retries = 0;
        loop {
            match fetch_cancellable(self.fetcher.as_ref(), month, &cancel).await {
                FetchResult::Cancelled => {
                    tracing::debug!(%month, generation = generation.value(), "fetch cancelled");
                    return FetchOutcome::Cancelled;
                }
                FetchResult::Fetched(page) => return self.complete(generation, month, Ok(page)),
                FetchResult::Failed(e) if e.is_transient() && retries < retry.max_retries => {
                    retries += 1;
                    tracing::warn!(
                        %month,
                        error = %e,
                        retry = retries,
                        max_retries = retry.max_retries,
                        "availability fetch failed; retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return FetchOutcome::Cancelled,
                        _ = tokio::time::sleep(retry.delay) => {}
                    }
                }
                FetchResult::Failed(e) => return self.complete(generation, month, Err(e)),
            }
        }
    }

    fn complete(
        self: &Arc<Self>,
        generation: FetchGeneration,
        month: MonthKey,
        result: Result<AvailabilityPage, FetchError>,
    ) -> FetchOutcome {
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            tracing::debug!(
                %month,
                generation = generation.value(),
                current = state.generation.value(),
                "discarding stale availability result"
            );
            return FetchOutcome::Discarded;
        }

        let outcome = match result {
            Ok(page) => {
                self.cache.replace(month, page.snapshot);
                match page.sync_status {
                    Some(snapshot) => self.tracker.apply(snapshot),
                    None => self.tracker.mark_untracked(),
                }
                state.phase = FetchPhase::Applied;
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(%month, error = %e, "availability fetch failed; clearing month");
                self.cache
                    .replace(month, AvailabilitySnapshot::empty(&self.namespaces));
                state.phase = FetchPhase::FailedAndCleared;
                FetchOutcome::FailedAndCleared
            }
        };

        if state.refresh_pending {
            tracing::debug!(%month, "starting deferred refresh");
            // Detached; its result goes through the same generation check.
            let _ = self.begin(&mut state, month, RetryPolicy::none());
        }
        outcome
    }
}
