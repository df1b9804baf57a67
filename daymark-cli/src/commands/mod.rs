pub mod show;
pub mod status;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use daymark_core::availability::HttpAvailabilityFetcher;
use daymark_core::{
    AvailabilityCache, FetchOutcome, MonthKey, RequestLifecycleController, SyncSettings,
    SyncStatusTracker,
};

use crate::utils::tui::create_spinner;

/// One month fetched without a live channel.
pub struct LoadedMonth {
    pub month: MonthKey,
    pub cache: AvailabilityCache,
    pub tracker: SyncStatusTracker,
    pub outcome: FetchOutcome,
}

impl LoadedMonth {
    pub fn failed(&self) -> bool {
        self.outcome == FetchOutcome::FailedAndCleared
    }
}

/// Fetch `month` once, with the configured retries.
pub async fn load_month(settings: &SyncSettings, month: MonthKey) -> Result<LoadedMonth> {
    let fetcher = Arc::new(HttpAvailabilityFetcher::new(settings)?);
    let cache = AvailabilityCache::new();
    let tracker = SyncStatusTracker::new();
    let controller = RequestLifecycleController::new(
        fetcher,
        cache.clone(),
        tracker.clone(),
        settings.namespaces.clone(),
        settings.retry,
    );

    let spinner = create_spinner(format!("Loading {month}"));
    let outcome = controller.change_month(month)?.outcome().await;
    spinner.finish_and_clear();
    controller.shutdown();

    Ok(LoadedMonth {
        month,
        cache,
        tracker,
        outcome,
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
