//! Runtime settings for an availability session.
//!
//! The core never reads files or the environment; front ends build a
//! [`SyncSettings`] and hand it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_RECONNECT_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY,
};
use crate::error::{DaymarkError, DaymarkResult};
use crate::namespace::NamespaceSet;

/// Path of the push channel relative to the server root.
const PUSH_PATH: &str = "ws";

/// First column of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Retries applied to the fetch started by a month change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Reconnect schedule for the push channel: a fixed delay, forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Root of the REST API (`/availability` is resolved against it).
    pub base_url: Url,
    /// WebSocket endpoint of the push channel.
    pub push_url: Url,
    pub namespaces: NamespaceSet,
    pub retry: RetryPolicy,
    pub reconnect: ReconnectPolicy,
    pub request_timeout: Duration,
    pub week_start: WeekStart,
}

impl SyncSettings {
    /// Settings with defaults for everything but the server. The push URL is
    /// derived from the base URL (`http` → `ws`, `https` → `wss`).
    pub fn new(base_url: Url) -> DaymarkResult<Self> {
        let push_url = derive_push_url(&base_url)?;
        Ok(SyncSettings {
            base_url,
            push_url,
            namespaces: NamespaceSet::default(),
            retry: RetryPolicy::default(),
            reconnect: ReconnectPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            week_start: WeekStart::default(),
        })
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceSet) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_push_url(mut self, push_url: Url) -> Self {
        self.push_url = push_url;
        self
    }
}

/// Resolve `path` below the base URL's path, so a server mounted at
/// `https://host/api/` serves `https://host/api/<path>`.
pub(crate) fn resolve_under(base_url: &Url, path: &str) -> DaymarkResult<Url> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| DaymarkError::Config(e.to_string()))
}

fn derive_push_url(base_url: &Url) -> DaymarkResult<Url> {
    let scheme = match base_url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(DaymarkError::Config(format!(
                "Unsupported server scheme '{other}' (expected http or https)"
            )));
        }
    };

    let mut push_url = resolve_under(base_url, PUSH_PATH)?;
    push_url
        .set_scheme(scheme)
        .map_err(|_| DaymarkError::Config(format!("Could not derive push URL from {base_url}")))?;
    Ok(push_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url_follows_base_scheme() {
        let settings = SyncSettings::new(Url::parse("https://dash.example.com").unwrap()).unwrap();
        assert_eq!(settings.push_url.as_str(), "wss://dash.example.com/ws");

        let settings = SyncSettings::new(Url::parse("http://127.0.0.1:8000").unwrap()).unwrap();
        assert_eq!(settings.push_url.as_str(), "ws://127.0.0.1:8000/ws");
    }

    #[test]
    fn test_push_url_keeps_base_path() {
        for base in ["https://dash.example.com/api/", "https://dash.example.com/api"] {
            let settings = SyncSettings::new(Url::parse(base).unwrap()).unwrap();
            assert_eq!(settings.push_url.as_str(), "wss://dash.example.com/api/ws");
        }
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(SyncSettings::new(Url::parse("ftp://example.com").unwrap()).is_err());
    }
}
