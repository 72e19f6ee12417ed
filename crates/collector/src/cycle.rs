//! One full collection cycle: membership, enumeration, counting, publishing.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use {
    chrono::{DateTime, Utc},
    guildwatch_config::{ExclusionSet, ExporterConfig},
    guildwatch_discord::{DiscordApi, MAX_MEMBERS_PER_REQUEST},
    guildwatch_metrics::GaugeStore,
    tracing::{info, warn},
};

use crate::{
    dispatcher::Dispatcher,
    enumerator::eligible_channels,
    error::{Error, PHASE_CHANNELS, PHASE_MEMBERS, Result},
    publisher::{PublishSummary, Publisher},
};

/// What a [`Collector`] needs to know about its target.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub guild_id: String,
    pub excluded: ExclusionSet,
    pub max_concurrent: usize,
    pub max_pages: Option<usize>,
}

impl CollectorSettings {
    #[must_use]
    pub fn from_config(config: &ExporterConfig) -> Self {
        Self {
            guild_id: config.server_id.clone(),
            excluded: config.exclusion_set(),
            max_concurrent: config.collector.max_concurrent_channels,
            max_pages: config.collector.page_cap(),
        }
    }
}

/// Summary of one cycle, logged by the scheduler.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Published membership count, `None` when the request failed.
    pub members: Option<u64>,
    /// `false` when channel enumeration failed and counting was skipped.
    pub enumerated: bool,
    pub eligible_channels: usize,
    pub channels: PublishSummary,
}

impl CycleReport {
    /// Whether every request in the cycle succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.members.is_some() && self.enumerated && self.channels.failed == 0
    }
}

/// Drives collection cycles for one guild.
pub struct Collector {
    api: Arc<dyn DiscordApi>,
    store: Arc<GaugeStore>,
    publisher: Publisher,
    dispatcher: Dispatcher,
    guild_id: String,
    excluded: ExclusionSet,
}

impl Collector {
    #[must_use]
    pub fn new(api: Arc<dyn DiscordApi>, store: Arc<GaugeStore>, settings: CollectorSettings) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::clone(&api),
            settings.max_concurrent,
            settings.max_pages,
        );
        Self {
            api,
            publisher: Publisher::new(Arc::clone(&store)),
            store,
            dispatcher,
            guild_id: settings.guild_id,
            excluded: settings.excluded,
        }
    }

    #[must_use]
    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    /// Fetch and publish the member count with a single request.
    ///
    /// Guilds above [`MAX_MEMBERS_PER_REQUEST`] members report the cap.
    pub async fn update_member_count(&self) -> Result<u64> {
        let members = self
            .api
            .guild_members(&self.guild_id, MAX_MEMBERS_PER_REQUEST)
            .await
            .map_err(|source| Error::upstream(PHASE_MEMBERS, source))?;
        let count = members.len() as u64;
        self.publisher.publish_members(count);
        Ok(count)
    }

    /// Enumerate, count and publish every eligible channel.
    ///
    /// Returns the number of eligible channels and the publish summary.
    /// Only enumeration failure is an error; per-channel failures are part of
    /// the summary.
    pub async fn update_message_counts(&self) -> Result<(usize, PublishSummary)> {
        let channels = eligible_channels(self.api.as_ref(), &self.guild_id, &self.excluded).await?;
        if channels.is_empty() {
            info!(guild_id = %self.guild_id, "no active channels to process");
            return Ok((0, PublishSummary::default()));
        }

        let eligible = channels.len();
        let results = self.dispatcher.dispatch(channels).await;
        Ok((eligible, self.publisher.publish_results(results)))
    }

    /// Run one complete cycle. Never fails: each phase's errors are logged
    /// and reflected in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let members = match self.update_member_count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(guild_id = %self.guild_id, error = %e, "failed to get guild members");
                self.store.record_upstream_failure(PHASE_MEMBERS);
                None
            },
        };

        let (enumerated, eligible, channels) = match self.update_message_counts().await {
            Ok((eligible, summary)) => (true, eligible, summary),
            Err(e) => {
                warn!(guild_id = %self.guild_id, error = %e, "failed to get guild channels");
                self.store.record_upstream_failure(PHASE_CHANNELS);
                (false, 0, PublishSummary::default())
            },
        };

        let elapsed = start.elapsed();
        self.store.record_cycle(elapsed, SystemTime::now());

        CycleReport {
            started_at,
            elapsed,
            members,
            enumerated,
            eligible_channels: eligible,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{Page, ScriptedApi, pages},
    };

    const PAGE: usize = crate::counter::PAGE_SIZE;

    fn settings(excluded: &str) -> CollectorSettings {
        CollectorSettings {
            guild_id: "42".into(),
            excluded: ExclusionSet::parse_csv(excluded),
            max_concurrent: 2,
            max_pages: None,
        }
    }

    fn collector(api: ScriptedApi, excluded: &str) -> (Collector, Arc<GaugeStore>) {
        let store = Arc::new(GaugeStore::default());
        let collector = Collector::new(Arc::new(api), Arc::clone(&store), settings(excluded));
        (collector, store)
    }

    #[tokio::test]
    async fn clean_cycle_publishes_everything() {
        let api = ScriptedApi::new()
            .with_members(17)
            .with_text_channel("1", "general", pages(&[PAGE, 3]))
            .with_text_channel("2", "random", pages(&[0]));
        let (collector, store) = collector(api, "");

        let report = collector.run_cycle().await;

        assert!(report.is_clean());
        assert_eq!(report.members, Some(17));
        assert_eq!(report.eligible_channels, 2);
        assert_eq!(report.channels.succeeded, 2);
        assert_eq!(store.members(), Some(17));
        assert_eq!(store.channel_messages("general"), Some(103));
        assert_eq!(store.channel_messages("random"), Some(0));
        assert!(store.render().contains("guildwatch_cycles_total 1"));
    }

    #[tokio::test]
    async fn member_failure_does_not_skip_channels() {
        let api = ScriptedApi::new()
            .failing_members()
            .with_text_channel("1", "general", pages(&[5]));
        let (collector, store) = collector(api, "");

        let report = collector.run_cycle().await;

        assert_eq!(report.members, None);
        assert!(!report.is_clean());
        assert_eq!(store.members(), None);
        assert_eq!(store.channel_messages("general"), Some(5));
        assert!(
            store
                .render()
                .contains(r#"guildwatch_upstream_failures_total{phase="members"} 1"#)
        );
    }

    #[tokio::test]
    async fn enumeration_failure_keeps_members() {
        let api = ScriptedApi::new().with_members(3).failing_channels();
        let (collector, store) = collector(api, "");

        let report = collector.run_cycle().await;

        assert!(!report.enumerated);
        assert_eq!(report.members, Some(3));
        assert_eq!(store.members(), Some(3));
        assert!(store.snapshot().channels.is_empty());
    }

    #[tokio::test]
    async fn no_eligible_channels_skips_counting() {
        let api = ScriptedApi::new().with_text_channel("1", "general", vec![Page::Fail]);
        let (collector, store) = collector(api, "general");

        let report = collector.run_cycle().await;

        assert!(report.enumerated);
        assert_eq!(report.eligible_channels, 0);
        assert_eq!(report.channels, PublishSummary::default());
        assert!(store.snapshot().channels.is_empty());
    }

    #[tokio::test]
    async fn channel_failure_is_contained() {
        let api = ScriptedApi::new()
            .with_text_channel("1", "general", pages(&[8]))
            .with_text_channel("2", "broken", vec![Page::Len(PAGE), Page::Fail]);
        let (collector, store) = collector(api, "");

        let report = collector.run_cycle().await;

        assert_eq!(report.channels.succeeded, 1);
        assert_eq!(report.channels.failed, 1);
        assert_eq!(store.channel_messages("general"), Some(8));
        assert_eq!(store.channel_messages("broken"), None);
    }

    #[test]
    fn settings_from_config() {
        let config = ExporterConfig {
            server_id: "99".into(),
            exclude_channels: guildwatch_config::ChannelList::Csv("a,b".into()),
            ..Default::default()
        };
        let settings = CollectorSettings::from_config(&config);
        assert_eq!(settings.guild_id, "99");
        assert_eq!(settings.excluded.len(), 2);
        assert_eq!(settings.max_concurrent, 5);
        assert_eq!(settings.max_pages, Some(50_000));
    }
}
