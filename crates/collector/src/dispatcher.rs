//! Bounded fan-out of per-channel counting.
//!
//! ```text
//! channels ──spawn──▶ [task per channel] ──acquire──▶ [Semaphore(K)] ──▶ count
//!                                                         │
//!                      join all ◀── one result each ◀──────┘ permit dropped
//! ```

use std::sync::Arc;

use {
    futures::future::join_all,
    guildwatch_discord::{Channel, DiscordApi},
    tokio::sync::Semaphore,
    tracing::{debug, info, warn},
};

use crate::{
    counter::count_messages,
    error::{Error, Result},
};

/// Outcome of counting one channel: a total or the reason it failed.
#[derive(Debug)]
pub struct ChannelCountResult {
    pub channel: Channel,
    pub outcome: Result<u64>,
}

impl ChannelCountResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs [`count_messages`] over many channels with at most
/// `max_concurrent` counts in flight.
pub struct Dispatcher {
    api: Arc<dyn DiscordApi>,
    max_concurrent: usize,
    max_pages: Option<usize>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(api: Arc<dyn DiscordApi>, max_concurrent: usize, max_pages: Option<usize>) -> Self {
        Self {
            api,
            max_concurrent,
            max_pages,
        }
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Count every channel, returning exactly one result per input channel.
    pub async fn dispatch(&self, channels: Vec<Channel>) -> Vec<ChannelCountResult> {
        info!(
            channels = channels.len(),
            max_concurrent = self.max_concurrent,
            "counting channel messages"
        );
        let api = Arc::clone(&self.api);
        let max_pages = self.max_pages;
        dispatch_bounded(channels, self.max_concurrent, move |channel: Channel| {
            let api = Arc::clone(&api);
            async move { count_messages(api.as_ref(), &channel.id, max_pages).await }
        })
        .await
    }
}

/// Run `count` for every channel behind a `limit`-permit admission gate.
///
/// Every unit is spawned up front and waits for a permit before doing any
/// work. The permit is held for the unit's whole lifetime and released when
/// the task ends, whether it succeeded, failed or panicked. The call returns
/// once every unit has reported; failures never short-circuit the others.
/// Results come back in input order, which callers must not rely on for
/// anything but pairing. A `limit` of 0 is raised to 1 with a warning.
pub async fn dispatch_bounded<F, Fut>(
    channels: Vec<Channel>,
    limit: usize,
    count: F,
) -> Vec<ChannelCountResult>
where
    F: Fn(Channel) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u64>> + Send + 'static,
{
    let limit = if limit == 0 {
        warn!("concurrency limit of 0 would admit nothing, using 1");
        1
    } else {
        limit
    };
    let gate = Arc::new(Semaphore::new(limit));
    let count = Arc::new(count);

    let units: Vec<_> = channels
        .into_iter()
        .map(|channel| {
            let gate = Arc::clone(&gate);
            let count = Arc::clone(&count);
            let unit_channel = channel.clone();
            let handle = tokio::spawn(async move {
                let _permit = gate
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::task_failed(&unit_channel.id, "admission gate closed"))?;
                debug!(channel = %unit_channel.name, "permit acquired");
                (*count)(unit_channel).await
            });
            (channel, handle)
        })
        .collect();

    join_all(units.into_iter().map(|(channel, handle)| async move {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(Error::task_failed(&channel.id, join_error.to_string())),
        };
        ChannelCountResult { channel, outcome }
    }))
    .await
}
