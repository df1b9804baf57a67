//! JSON shape of `GET /availability`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::availability::snapshot::AvailabilitySnapshot;
use crate::error::FetchError;
use crate::month::{DayStamp, MonthKey};
use crate::namespace::{NamespaceKey, NamespaceSet};
use crate::sync_status::SyncSnapshot;

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    data: BTreeMap<NamespaceKey, Vec<String>>,
    #[serde(default)]
    sync_status: Option<SyncSnapshot>,
}

/// A parsed availability response for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityPage {
    pub month: MonthKey,
    pub snapshot: AvailabilitySnapshot,
    /// `None` when the backend doesn't track sync for this request.
    pub sync_status: Option<SyncSnapshot>,
}

impl AvailabilityPage {
    /// Parse a response body. A body that isn't the expected JSON shape is a
    /// [`FetchError::Parse`]; individual day strings that aren't dates are
    /// dropped.
    pub fn parse(body: &str, month: MonthKey, namespaces: &NamespaceSet) -> Result<Self, FetchError> {
        let response: AvailabilityResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        let days = response
            .data
            .into_iter()
            .map(|(namespace, raw_days)| {
                let stamps: BTreeSet<DayStamp> = raw_days
                    .iter()
                    .filter_map(|raw| match DayStamp::parse(raw) {
                        Ok(stamp) => Some(stamp),
                        Err(_) => {
                            tracing::warn!(%namespace, day = %raw, "dropping unparseable day");
                            None
                        }
                    })
                    .collect();
                (namespace, stamps)
            })
            .collect();

        Ok(AvailabilityPage {
            month,
            snapshot: AvailabilitySnapshot::from_days(days, namespaces),
            sync_status: response.sync_status,
        })
    }
}
