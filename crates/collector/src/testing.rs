#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Scripted in-memory [`DiscordApi`] for collector tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    guildwatch_discord::{Channel, ChannelKind, DiscordApi, Error, Member, Message, Result},
};

/// Outcome of one scripted page request.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Page {
    Len(usize),
    Fail,
}

/// Pages for `[100, 100, 30]`-style scripts.
pub(crate) fn pages(lens: &[usize]) -> Vec<Page> {
    lens.iter().copied().map(Page::Len).collect()
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    members: Option<usize>,
    channels: Option<Vec<Channel>>,
    pages: HashMap<String, Vec<Page>>,
    delay: Duration,
    served: Mutex<HashMap<String, usize>>,
    cursors: Mutex<HashMap<String, Vec<Option<String>>>>,
    channel_list_calls: AtomicUsize,
    list_delay: Duration,
    listing: AtomicUsize,
    max_listing: AtomicUsize,
    list_starts: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            members: Some(0),
            channels: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub(crate) fn with_members(mut self, count: usize) -> Self {
        self.members = Some(count);
        self
    }

    pub(crate) fn failing_members(mut self) -> Self {
        self.members = None;
        self
    }

    pub(crate) fn failing_channels(mut self) -> Self {
        self.channels = None;
        self
    }

    pub(crate) fn with_channel(mut self, channel: Channel, script: Vec<Page>) -> Self {
        self.pages.insert(channel.id.clone(), script);
        if let Some(channels) = self.channels.as_mut() {
            channels.push(channel);
        }
        self
    }

    pub(crate) fn with_text_channel(self, id: &str, name: &str, script: Vec<Page>) -> Self {
        self.with_channel(Channel::new(id, name, ChannelKind::Text), script)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make every channel listing take `delay`.
    pub(crate) fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    /// Most channel listings observed in flight at once.
    pub(crate) fn max_concurrent_listings(&self) -> usize {
        self.max_listing.load(Ordering::SeqCst)
    }

    /// Start time of every channel listing, in call order.
    pub(crate) fn list_starts(&self) -> Vec<Instant> {
        self.list_starts.lock().unwrap().clone()
    }

    /// Cursors passed for each page request of `channel_id`, in order.
    pub(crate) fn cursors(&self, channel_id: &str) -> Vec<Option<String>> {
        self.cursors
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn page_requests(&self, channel_id: &str) -> usize {
        self.served.lock().unwrap().get(channel_id).copied().unwrap_or(0)
    }

    pub(crate) fn channel_list_calls(&self) -> usize {
        self.channel_list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn unavailable() -> Error {
    Error::Status {
        status: 503,
        body: "service unavailable".into(),
    }
}

#[async_trait]
impl DiscordApi for ScriptedApi {
    async fn guild_members(&self, _guild_id: &str, limit: usize) -> Result<Vec<Member>> {
        match self.members {
            Some(count) => Ok(vec![Member { user: None }; count.min(limit)]),
            None => Err(unavailable()),
        }
    }

    async fn guild_channels(&self, _guild_id: &str) -> Result<Vec<Channel>> {
        self.channel_list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_starts.lock().unwrap().push(Instant::now());
        let now = self.listing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_listing.fetch_max(now, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        self.listing.fetch_sub(1, Ordering::SeqCst);

        self.channels
            .clone()
            .ok_or_else(unavailable)
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<Message>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let index = {
            let mut served = self.served.lock().unwrap();
            let n = served.entry(channel_id.to_string()).or_default();
            *n += 1;
            *n - 1
        };
        self.cursors
            .lock()
            .unwrap()
            .entry(channel_id.to_string())
            .or_default()
            .push(before.map(str::to_string));

        let page = self
            .pages
            .get(channel_id)
            .and_then(|script| script.get(index).copied())
            .unwrap_or(Page::Len(0));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match page {
            Page::Len(len) => Ok((0..len.min(limit))
                .map(|i| Message::new(format!("{channel_id}-p{index}-m{i}")))
                .collect()),
            Page::Fail => Err(Error::Status {
                status: 500,
                body: "internal error".into(),
            }),
        }
    }
}
