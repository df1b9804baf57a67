//! One visible-month session over the availability layer.
//!
//! A session owns the cache, the sync tracker, the request controller and
//! the push channel. The channel is opened when a month is shown and runs
//! until ingestion reports complete; showing another month re-opens it if it
//! had stopped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::availability::{AvailabilityCache, AvailabilityFetcher, HttpAvailabilityFetcher};
use crate::error::{DaymarkError, DaymarkResult};
use crate::grid::{CalendarGridProjector, DayCell};
use crate::lifecycle::{FetchPhase, FetchTicket, RequestLifecycleController};
use crate::live::{ChannelState, LiveStatusChannel, PushTransport, RefreshTrigger, WebSocketTransport};
use crate::month::{DayStamp, MonthKey};
use crate::namespace::NamespaceKey;
use crate::settings::SyncSettings;
use crate::sync_status::{SyncStatus, SyncStatusTracker};

type DaySelectedHandler = Box<dyn Fn(&DayStamp) + Send + Sync>;

pub struct AvailabilitySession {
    settings: SyncSettings,
    cache: AvailabilityCache,
    tracker: SyncStatusTracker,
    controller: RequestLifecycleController,
    projector: CalendarGridProjector,
    transport: Arc<dyn PushTransport>,
    channel: Mutex<Option<LiveStatusChannel>>,
    on_day_selected: Mutex<Option<DaySelectedHandler>>,
}

impl AvailabilitySession {
    /// Session talking HTTP and WebSocket to the configured server.
    pub fn new(settings: SyncSettings) -> DaymarkResult<Self> {
        let fetcher = Arc::new(HttpAvailabilityFetcher::new(&settings)?);
        let transport = Arc::new(WebSocketTransport::new(settings.push_url.clone()));
        Ok(Self::with_parts(settings, fetcher, transport))
    }

    /// Session over caller-supplied fetcher and push transport.
    pub fn with_parts(
        settings: SyncSettings,
        fetcher: Arc<dyn AvailabilityFetcher>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        let cache = AvailabilityCache::new();
        let tracker = SyncStatusTracker::new();
        let controller = RequestLifecycleController::new(
            fetcher,
            cache.clone(),
            tracker.clone(),
            settings.namespaces.clone(),
            settings.retry,
        );
        let projector = CalendarGridProjector::new(settings.namespaces.clone(), settings.week_start);

        AvailabilitySession {
            settings,
            cache,
            tracker,
            controller,
            projector,
            transport,
            channel: Mutex::new(None),
            on_day_selected: Mutex::new(None),
        }
    }

    /// Make `month` visible: make sure the push channel runs, then fetch.
    pub fn show_month(&self, month: MonthKey) -> DaymarkResult<FetchTicket> {
        if self.controller.is_shut_down() {
            return Err(DaymarkError::ShutDown);
        }
        // Open before fetching, so a completion reported by this fetch is
        // seen by the new channel.
        self.ensure_channel();
        self.controller.change_month(month)
    }

    pub fn next_month(&self) -> DaymarkResult<FetchTicket> {
        let month = self.visible_month().ok_or(DaymarkError::NoVisibleMonth)?;
        self.show_month(month.next())
    }

    pub fn prev_month(&self) -> DaymarkResult<FetchTicket> {
        let month = self.visible_month().ok_or(DaymarkError::NoVisibleMonth)?;
        self.show_month(month.prev())
    }

    /// Fetch the visible month again.
    pub fn refresh(&self) -> Option<FetchTicket> {
        self.controller.refresh()
    }

    pub fn visible_month(&self) -> Option<MonthKey> {
        self.controller.visible_month()
    }

    pub fn phase(&self) -> FetchPhase {
        self.controller.phase()
    }

    /// Grid for the visible month.
    pub fn grid(&self, today: NaiveDate) -> Option<Vec<DayCell>> {
        let month = self.visible_month()?;
        Some(self.projector.project(month, &self.cache, today))
    }

    pub fn projector(&self) -> &CalendarGridProjector {
        &self.projector
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.tracker.current()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.lock_channel()
            .as_ref()
            .map(LiveStatusChannel::state)
            .unwrap_or(ChannelState::Closed)
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }

    pub fn tracker(&self) -> &SyncStatusTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn on_day_selected(&self, handler: impl Fn(&DayStamp) + Send + Sync + 'static) {
        *self
            .on_day_selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(handler));
    }

    /// Select `day`. The handler only runs for days of the visible month
    /// that have data; returns whether it ran.
    pub fn select_day(&self, day: &DayStamp) -> bool {
        let Some(month) = self.visible_month() else {
            return false;
        };
        let in_month = day.date().is_some_and(|date| month.contains(date));
        let has_data = self
            .cache
            .get(month)
            .is_some_and(|snapshot| snapshot.has_data(&NamespaceKey::union(), day));
        if !(in_month && has_data) {
            tracing::debug!(%day, "ignoring selection of day without data");
            return false;
        }

        if let Some(handler) = self
            .on_day_selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            handler(day);
        }
        true
    }

    /// Stop everything: cancel the in-flight fetch, close the channel and its
    /// pending reconnect, drop cached months. Nothing is applied afterwards.
    pub async fn shutdown(&self) {
        self.controller.shutdown();
        self.cache.clear();
        let channel = self.lock_channel().take();
        if let Some(channel) = channel {
            channel.close().await;
        }
    }

    fn ensure_channel(&self) {
        let mut channel = self.lock_channel();
        if channel.as_ref().is_some_and(LiveStatusChannel::is_running) {
            return;
        }
        tracing::debug!(url = %self.settings.push_url, "opening push channel");
        let refresher: Arc<dyn RefreshTrigger> = Arc::new(self.controller.clone());
        *channel = Some(LiveStatusChannel::open(
            Arc::clone(&self.transport),
            self.tracker.clone(),
            refresher,
            self.settings.reconnect,
        ));
    }

    fn lock_channel(&self) -> MutexGuard<'_, Option<LiveStatusChannel>> {
        self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
