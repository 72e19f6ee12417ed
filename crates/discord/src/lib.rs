//! Minimal Discord REST client.
//!
//! Only the three read operations the collector needs are exposed, behind the
//! [`DiscordApi`] trait so the collection pipeline can run against a fake.

pub mod api;
pub mod client;
pub mod error;
mod ratelimit;
pub mod types;

pub use {
    api::DiscordApi,
    client::{HttpDiscordClient, MAX_MEMBERS_PER_REQUEST, MAX_MESSAGES_PER_REQUEST},
    error::{Error, Result},
    types::{Channel, ChannelKind, Member, Message},
};
