use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Channel, Member, Message},
};

/// The upstream operations the collection pipeline depends on.
///
/// Implementations own authentication, transport and rate-limit handling.
/// Callers see one `Result` per request and never retry.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// One page of guild members, at most `limit` entries.
    async fn guild_members(&self, guild_id: &str, limit: usize) -> Result<Vec<Member>>;

    /// Every channel of the guild visible to the credential.
    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>>;

    /// One page of channel messages, newest first, strictly older than
    /// `before` when a cursor is given.
    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<Message>>;
}
