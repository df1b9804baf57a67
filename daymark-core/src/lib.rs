//! Availability synchronization for daymark.
//!
//! This crate keeps a month calendar's "has data" badges consistent with a
//! backend that ingests several sources asynchronously:
//! - `availability` fetches and caches per-month day sets per namespace
//! - `lifecycle` makes sure only the latest request for the visible month applies
//! - `sync_status` and `live` track ingestion progress over a push channel
//! - `grid` projects a month into 42 day cells
//! - `session` wires all of it together

pub mod availability;
pub mod constants;
pub mod error;
pub mod grid;
pub mod lifecycle;
pub mod live;
pub mod month;
pub mod namespace;
pub mod session;
pub mod settings;
pub mod sync_status;

#[cfg(test)]
mod testing;

pub use availability::{AvailabilityCache, AvailabilityFetcher, AvailabilitySnapshot};
pub use error::{DaymarkError, DaymarkResult, FetchError};
pub use grid::{CalendarGridProjector, DayCell};
pub use lifecycle::{FetchOutcome, FetchPhase, RequestLifecycleController};
pub use live::{ChannelState, LiveStatusChannel};
pub use month::{DayStamp, MonthKey};
pub use namespace::{NamespaceKey, NamespaceSet};
pub use session::AvailabilitySession;
pub use settings::{SyncSettings, WeekStart};
pub use sync_status::{SyncSnapshot, SyncStatus, SyncStatusTracker};
