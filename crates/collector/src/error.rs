use thiserror::Error;

/// Phase label for a failed membership request.
pub const PHASE_MEMBERS: &str = "members";
/// Phase label for a failed channel enumeration.
pub const PHASE_CHANNELS: &str = "channels";

#[derive(Debug, Error)]
pub enum Error {
    /// Membership or enumeration request failed; that phase of the cycle is
    /// skipped.
    #[error("discord unavailable ({phase}): {source}")]
    UpstreamUnavailable {
        phase: &'static str,
        #[source]
        source: guildwatch_discord::Error,
    },

    /// A page request failed while counting one channel.
    #[error("failed to count messages in channel {channel_id}: {source}")]
    CountFailed {
        channel_id: String,
        #[source]
        source: guildwatch_discord::Error,
    },

    /// Pagination of one channel hit the configured page cap.
    #[error("channel {channel_id} exceeded the limit of {max_pages} pages")]
    PageLimitExceeded { channel_id: String, max_pages: usize },

    /// The counting task for one channel panicked or was aborted.
    #[error("counting task for channel {channel_id} did not complete: {reason}")]
    TaskFailed { channel_id: String, reason: String },
}

impl Error {
    #[must_use]
    pub fn upstream(phase: &'static str, source: guildwatch_discord::Error) -> Self {
        Self::UpstreamUnavailable { phase, source }
    }

    #[must_use]
    pub fn count_failed(channel_id: impl Into<String>, source: guildwatch_discord::Error) -> Self {
        Self::CountFailed {
            channel_id: channel_id.into(),
            source,
        }
    }

    #[must_use]
    pub fn task_failed(channel_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            channel_id: channel_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error only affects a single channel's count.
    #[must_use]
    pub fn is_count_failure(&self) -> bool {
        !matches!(self, Self::UpstreamUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
