//! Channel enumeration and eligibility filtering.

use {
    guildwatch_config::ExclusionSet,
    guildwatch_discord::{Channel, DiscordApi},
    tracing::debug,
};

use crate::error::{Error, PHASE_CHANNELS, Result};

/// List the guild's channels and keep only the countable ones.
///
/// An empty result is not an error; the caller decides to skip counting.
pub async fn eligible_channels(
    api: &dyn DiscordApi,
    guild_id: &str,
    excluded: &ExclusionSet,
) -> Result<Vec<Channel>> {
    let channels = api
        .guild_channels(guild_id)
        .await
        .map_err(|source| Error::upstream(PHASE_CHANNELS, source))?;
    let total = channels.len();
    let eligible = filter_channels(channels, excluded);
    debug!(guild_id, total, eligible = eligible.len(), "channels enumerated");
    Ok(eligible)
}

/// Keep text channels whose name is not excluded, preserving input order.
#[must_use]
pub fn filter_channels(channels: Vec<Channel>, excluded: &ExclusionSet) -> Vec<Channel> {
    channels
        .into_iter()
        .filter(|channel| {
            if !channel.is_text() {
                return false;
            }
            if excluded.contains(&channel.name) {
                debug!(channel = %channel.name, "skipping excluded channel");
                return false;
            }
            true
        })
        .collect()
}
