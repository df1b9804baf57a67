//! Fetching availability pages.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::availability::wire::AvailabilityPage;
use crate::error::{DaymarkError, DaymarkResult, FetchError};
use crate::month::MonthKey;
use crate::namespace::NamespaceSet;
use crate::settings::{SyncSettings, resolve_under};

/// Outcome of one cancellable fetch.
#[derive(Debug)]
pub enum FetchResult {
    Fetched(AvailabilityPage),
    /// The cancellation signal fired first. Not an error.
    Cancelled,
    Failed(FetchError),
}

/// Source of availability pages, one request per call.
#[async_trait]
pub trait AvailabilityFetcher: Send + Sync {
    async fn fetch(&self, month: MonthKey) -> Result<AvailabilityPage, FetchError>;
}

/// Run `fetcher` for `month` until it finishes or `cancel` fires. Dropping
/// the request future on cancellation aborts the request.
pub async fn fetch_cancellable(
    fetcher: &dyn AvailabilityFetcher,
    month: MonthKey,
    cancel: &CancellationToken,
) -> FetchResult {
    if cancel.is_cancelled() {
        return FetchResult::Cancelled;
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return FetchResult::Cancelled,
        result = fetcher.fetch(month) => result,
    };

    // A response that raced the signal still counts as cancelled.
    if cancel.is_cancelled() {
        return FetchResult::Cancelled;
    }

    match result {
        Ok(page) => FetchResult::Fetched(page),
        Err(e) => FetchResult::Failed(e),
    }
}

/// Fetches `GET {base_url}/availability?year=YYYY&month=MM`.
pub struct HttpAvailabilityFetcher {
    http: reqwest::Client,
    endpoint: Url,
    namespaces: NamespaceSet,
}

impl HttpAvailabilityFetcher {
    pub fn new(settings: &SyncSettings) -> DaymarkResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| DaymarkError::Config(format!("Could not build HTTP client: {e}")))?;

        let endpoint = resolve_under(&settings.base_url, "availability")?;

        Ok(HttpAvailabilityFetcher {
            http,
            endpoint,
            namespaces: settings.namespaces.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AvailabilityFetcher for HttpAvailabilityFetcher {
    async fn fetch(&self, month: MonthKey) -> Result<AvailabilityPage, FetchError> {
        tracing::debug!(%month, endpoint = %self.endpoint, "fetching availability");

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&month.query())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        AvailabilityPage::parse(&body, month, &self.namespaces)
    }
}
