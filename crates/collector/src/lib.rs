//! Periodic collection of Discord membership and per-channel message counts.
//!
//! One cycle fetches the member count, enumerates eligible text channels,
//! counts every channel's messages through a bounded pool of concurrent
//! tasks and publishes the successful counts into a shared
//! [`GaugeStore`](guildwatch_metrics::GaugeStore). Failed channels keep their
//! previous value. The [`Scheduler`] repeats cycles until cancelled.

pub mod counter;
pub mod cycle;
pub mod dispatcher;
pub mod enumerator;
pub mod error;
pub mod publisher;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    counter::{PAGE_SIZE, count_messages},
    cycle::{Collector, CollectorSettings, CycleReport},
    dispatcher::{ChannelCountResult, Dispatcher, dispatch_bounded},
    enumerator::{eligible_channels, filter_channels},
    error::{Error, Result},
    publisher::{PublishSummary, Publisher},
    scheduler::Scheduler,
};
