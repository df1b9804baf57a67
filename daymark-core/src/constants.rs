//! Defaults shared across the crate.

use std::time::Duration;

/// Namespace whose day set is the union of every source.
pub const UNION_NAMESPACE: &str = "all";

/// Canonical DayStamp format.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Six weeks of seven days.
pub const GRID_CELLS: usize = 42;

/// Retries after the first attempt of a month-change fetch.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Topics the push channel subscribes to on connect.
pub const SUBSCRIBED_TOPICS: [&str; 2] = ["sync_status", "sync_progress"];
