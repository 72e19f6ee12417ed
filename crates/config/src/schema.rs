//! Config schema types for the exporter.
use std::{collections::BTreeSet, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::error::{Error, Result};

/// Default Discord REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Root configuration.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExporterConfig {
    /// Bot token. Sent as `Authorization: Bot <token>`.
    pub token: Secret<String>,

    /// Guild (server) whose membership and channels are sampled.
    #[serde(
        rename = "serverID",
        alias = "serverId",
        alias = "server_id",
        deserialize_with = "string_or_number"
    )]
    pub server_id: String,

    /// Channel display names that are never counted.
    #[serde(alias = "exclude_channels")]
    pub exclude_channels: ChannelList,

    pub metrics: MetricsConfig,
    pub collector: CollectorConfig,
    pub discord: DiscordConfig,
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("token", &"[REDACTED]")
            .field("server_id", &self.server_id)
            .field("exclude_channels", &self.exclude_channels)
            .field("metrics", &self.metrics)
            .field("collector", &self.collector)
            .field("discord", &self.discord)
            .finish()
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            server_id: String::new(),
            exclude_channels: ChannelList::default(),
            metrics: MetricsConfig::default(),
            collector: CollectorConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

impl ExporterConfig {
    /// Check the settings the exporter cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(Error::invalid("Discord token is required"));
        }
        if self.server_id.trim().is_empty() {
            return Err(Error::invalid("serverID is required"));
        }
        if self.collector.max_concurrent_channels == 0 {
            return Err(Error::invalid(
                "collector.maxConcurrentChannels must be at least 1",
            ));
        }
        if self.collector.update_interval_secs == 0 {
            return Err(Error::invalid(
                "collector.updateIntervalSecs must be at least 1",
            ));
        }
        if self.collector.request_timeout_secs == 0 {
            return Err(Error::invalid(
                "collector.requestTimeoutSecs must be at least 1",
            ));
        }
        Ok(())
    }

    /// The exclusion set, parsed once at startup.
    #[must_use]
    pub fn exclusion_set(&self) -> ExclusionSet {
        self.exclude_channels.to_exclusion_set()
    }
}

/// Snowflake ids are often written unquoted; accept both forms.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Exposition endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricsConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 2112,
        }
    }
}

/// Collection pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
    /// Wait between the end of one cycle and the start of the next.
    pub update_interval_secs: u64,
    /// Admission gate size for per-channel counting.
    pub max_concurrent_channels: usize,
    /// Hard cap on pages fetched for one channel. `null` or `0` disables it.
    pub max_pages_per_channel: Option<usize>,
    /// Timeout applied to every upstream request.
    pub request_timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 15 * 60,
            max_concurrent_channels: 5,
            max_pages_per_channel: Some(50_000),
            request_timeout_secs: 30,
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Effective page cap, `None` when pagination is unbounded.
    #[must_use]
    pub fn page_cap(&self) -> Option<usize> {
        self.max_pages_per_channel.filter(|&cap| cap > 0)
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscordConfig {
    pub api_base_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

/// Excluded channel names as written in the config file: either a single
/// comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelList {
    Csv(String),
    List(Vec<String>),
}

impl Default for ChannelList {
    fn default() -> Self {
        Self::Csv(String::new())
    }
}

impl ChannelList {
    #[must_use]
    pub fn to_exclusion_set(&self) -> ExclusionSet {
        match self {
            Self::Csv(raw) => ExclusionSet::parse_csv(raw),
            Self::List(names) => ExclusionSet::from_names(names),
        }
    }
}

/// Channel display names skipped by the enumerator. Exact match on trimmed
/// names; read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    /// Parse `"a, b,,c"` into `{a, b, c}`.
    #[must_use]
    pub fn parse_csv(raw: &str) -> Self {
        Self::from_names(raw.split(','))
    }

    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
