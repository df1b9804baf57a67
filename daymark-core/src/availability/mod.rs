//! Which days have data, per namespace, per month.

mod cache;
mod fetcher;
mod snapshot;
mod wire;

pub use cache::AvailabilityCache;
pub use fetcher::{AvailabilityFetcher, FetchResult, HttpAvailabilityFetcher, fetch_cancellable};
pub use snapshot::AvailabilitySnapshot;
pub use wire::AvailabilityPage;
