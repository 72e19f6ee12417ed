//! Configuration loading and validation for the guildwatch exporter.
//!
//! Config files: `guildwatch.{toml,yaml,yml,json}`, then the legacy
//! `discord-exporter.*` names, searched in `./` then `~/.config/guildwatch/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, plus
//! `GUILDWATCH_*` environment overrides for the credential and server id.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, discover_and_load, find_config_file, load_config},
    schema::{
        ChannelList, CollectorConfig, DiscordConfig, ExclusionSet, ExporterConfig, MetricsConfig,
    },
};
