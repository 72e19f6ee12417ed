//! Metric name and label definitions.
//!
//! The two `discord_*` series are the exporter's public contract and keep the
//! names dashboards already query. Everything under `guildwatch_*` describes
//! the collector itself.

/// Series republished from Discord
pub mod discord {
    /// Number of members in the Discord server
    pub const MEMBERS_COUNT: &str = "discord_members_count";
    /// Number of messages per channel
    pub const MESSAGE_COUNT: &str = "discord_message_count";
}

/// Collector self-observability
pub mod collector {
    /// Completed collection cycles
    pub const CYCLES_TOTAL: &str = "guildwatch_cycles_total";
    /// Wall time of the last collection cycle
    pub const CYCLE_DURATION_SECONDS: &str = "guildwatch_cycle_duration_seconds";
    /// Unix time at which the last cycle finished
    pub const LAST_CYCLE_TIMESTAMP_SECONDS: &str = "guildwatch_last_cycle_timestamp_seconds";
    /// Channels whose message count could not be collected
    pub const CHANNEL_COUNT_FAILURES_TOTAL: &str = "guildwatch_channel_count_failures_total";
    /// Failed membership or enumeration requests, by phase
    pub const UPSTREAM_FAILURES_TOTAL: &str = "guildwatch_upstream_failures_total";
}

/// Common label keys
pub mod labels {
    pub const CHANNEL: &str = "channel";
    pub const PHASE: &str = "phase";
}

pub(crate) fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_gauge!(discord::MEMBERS_COUNT, "Number of members in the Discord server");
    describe_gauge!(discord::MESSAGE_COUNT, "Number of messages per channel");
    describe_counter!(collector::CYCLES_TOTAL, "Completed collection cycles");
    describe_gauge!(
        collector::CYCLE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Wall time of the last collection cycle"
    );
    describe_gauge!(
        collector::LAST_CYCLE_TIMESTAMP_SECONDS,
        "Unix time at which the last cycle finished"
    );
    describe_counter!(
        collector::CHANNEL_COUNT_FAILURES_TOTAL,
        "Channels whose message count could not be collected"
    );
    describe_counter!(
        collector::UPSTREAM_FAILURES_TOTAL,
        "Failed membership or enumeration requests"
    );
}
