//! Paginated message counting for a single channel.

use {
    guildwatch_discord::{DiscordApi, MAX_MESSAGES_PER_REQUEST},
    tracing::{debug, trace},
};

use crate::error::{Error, Result};

/// Messages requested per page. A shorter page ends pagination.
pub const PAGE_SIZE: usize = MAX_MESSAGES_PER_REQUEST;

/// Count every message in `channel_id`.
///
/// Pages are requested newest first; each request's cursor is the id of the
/// oldest message in the previous page. The first page shorter than
/// [`PAGE_SIZE`] (empty included) ends the walk, even though a channel whose
/// size is an exact multiple of the page size costs one extra empty request.
///
/// Any failed page fails the whole count: no partial total, no retry.
/// `max_pages` bounds the number of requests; reaching it without a short
/// page is reported as [`Error::PageLimitExceeded`].
pub async fn count_messages(
    api: &dyn DiscordApi,
    channel_id: &str,
    max_pages: Option<usize>,
) -> Result<u64> {
    let mut total: u64 = 0;
    let mut cursor: Option<String> = None;
    let mut pages: usize = 0;

    loop {
        if let Some(max_pages) = max_pages.filter(|&cap| pages >= cap) {
            return Err(Error::PageLimitExceeded {
                channel_id: channel_id.to_string(),
                max_pages,
            });
        }

        let page = api
            .channel_messages(channel_id, PAGE_SIZE, cursor.as_deref())
            .await
            .map_err(|source| Error::count_failed(channel_id, source))?;
        pages += 1;
        total += page.len() as u64;
        trace!(channel_id, pages, len = page.len(), total, "fetched message page");

        match page.last() {
            Some(oldest) if page.len() >= PAGE_SIZE => cursor = Some(oldest.id.clone()),
            _ => break,
        }
    }

    debug!(channel_id, pages, total, "channel counted");
    Ok(total)
}
