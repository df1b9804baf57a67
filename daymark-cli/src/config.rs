//! CLI configuration at ~/.config/daymark/config.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, File};
use daymark_core::settings::{ReconnectPolicy, RetryPolicy};
use daymark_core::{NamespaceSet, SyncSettings, WeekStart};
use serde::Deserialize;
use url::Url;

static DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
static DEFAULT_NAMESPACES: [&str; 4] = ["feed", "news", "activity", "social"];

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_namespaces() -> Vec<String> {
    DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect()
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

fn default_reconnect_delay_secs() -> u64 {
    ReconnectPolicy::default().delay.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    daymark_core::constants::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

#[derive(Deserialize, Clone, Debug)]
pub struct DaymarkConfig {
    #[serde(default = "default_server")]
    pub server: String,

    /// Overrides the push endpoint derived from `server`.
    #[serde(default)]
    pub push_url: Option<String>,

    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,

    #[serde(default)]
    pub week_start: WeekStart,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl DaymarkConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("daymark");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, creating a commented default on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: DaymarkConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .with_context(|| format!("Could not read {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# daymark configuration

# Dashboard backend serving /availability and /ws:
# server = \"{DEFAULT_SERVER}\"

# Push channel endpoint, if it isn't <server>/ws:
# push_url = \"ws://127.0.0.1:8000/ws\"

# Data sources shown next to the combined \"all\" badge:
# namespaces = [{namespaces}]

# First column of the month grid (\"sunday\" or \"monday\"):
# week_start = \"sunday\"

# Retries for a failed month load, one second apart:
# max_retries = {retries}

# Seconds between push channel reconnects:
# reconnect_delay_secs = {reconnect}

# Seconds before an availability request times out:
# request_timeout_secs = {timeout}
",
            namespaces = DEFAULT_NAMESPACES
                .iter()
                .map(|ns| format!("\"{ns}\""))
                .collect::<Vec<_>>()
                .join(", "),
            retries = default_max_retries(),
            reconnect = default_reconnect_delay_secs(),
            timeout = default_request_timeout_secs(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }

    /// Build core settings; `server` overrides the configured server.
    pub fn sync_settings(&self, server: Option<&str>) -> Result<SyncSettings> {
        let server = server.unwrap_or(&self.server);
        let base_url = Url::parse(server).with_context(|| format!("Invalid server URL '{server}'"))?;

        let mut settings = SyncSettings::new(base_url)?
            .with_namespaces(NamespaceSet::new(self.namespaces.iter().map(String::as_str)));
        if let Some(push_url) = &self.push_url {
            let push_url =
                Url::parse(push_url).with_context(|| format!("Invalid push URL '{push_url}'"))?;
            settings = settings.with_push_url(push_url);
        }

        settings.week_start = self.week_start;
        settings.retry.max_retries = self.max_retries;
        settings.reconnect.delay = Duration::from_secs(self.reconnect_delay_secs);
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(settings)
    }
}
