//! `reqwest`-backed implementation of [`DiscordApi`].

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    reqwest::{
        StatusCode,
        header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
    },
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
    url::Url,
};

use crate::{
    api::DiscordApi,
    error::{Error, Result},
    ratelimit::RateLimiter,
    types::{Channel, Member, Message},
};

/// Upper bound Discord accepts for `GET /guilds/{id}/members`.
pub const MAX_MEMBERS_PER_REQUEST: usize = 1000;
/// Upper bound Discord accepts for `GET /channels/{id}/messages`.
pub const MAX_MESSAGES_PER_REQUEST: usize = 100;

/// Attempts per request when Discord answers 429.
const MAX_RATE_LIMIT_ATTEMPTS: u32 = 3;
/// Longest `retry_after` honoured before giving up on the request.
const MAX_RETRY_AFTER_SECS: f64 = 60.0;

/// Discord REST client authenticated with a static bot token.
///
/// Requests on a route whose budget is spent wait for the window to reset;
/// a 429 that still gets through is retried after `retry_after`.
pub struct HttpDiscordClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
    limiter: RateLimiter,
}

impl std::fmt::Debug for HttpDiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDiscordClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpDiscordClient {
    /// Build a client. `timeout` bounds every request, including body reads.
    pub fn new(token: Secret<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "DiscordBot (guildwatch, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        // Validate once so later joins only fail on bad ids.
        Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            limiter: RateLimiter::default(),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{path}", self.base_url))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let route = url.path().to_string();
        let mut attempts = 0;
        loop {
            attempts += 1;
            self.limiter.acquire(&route).await;
            debug!(url = %url, attempts, "discord request");
            let resp = self
                .http
                .get(url.clone())
                .header(AUTHORIZATION, format!("Bot {}", self.token.expose_secret()))
                .send()
                .await?;
            self.limiter.update(&route, resp.headers(), Instant::now());

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let header_hint = retry_after_header(resp.headers());
                let body = resp.text().await.unwrap_or_default();
                let retry_after_secs = header_hint
                    .or_else(|| retry_after_body(&body))
                    .unwrap_or(1.0);
                if attempts >= MAX_RATE_LIMIT_ATTEMPTS || retry_after_secs > MAX_RETRY_AFTER_SECS {
                    return Err(Error::RateLimited {
                        attempts,
                        retry_after_secs,
                    });
                }
                warn!(url = %url, retry_after_secs, attempts, "rate limited by discord, backing off");
                tokio::time::sleep(Duration::from_secs_f64(retry_after_secs)).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(resp.json::<T>().await?);
        }
    }
}

fn retry_after_header(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(sanitize_delay)
}

fn retry_after_body(body: &str) -> Option<f64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("retry_after")?
        .as_f64()
        .and_then(sanitize_delay)
}

fn sanitize_delay(secs: f64) -> Option<f64> {
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

#[async_trait]
impl DiscordApi for HttpDiscordClient {
    async fn guild_members(&self, guild_id: &str, limit: usize) -> Result<Vec<Member>> {
        let limit = limit.clamp(1, MAX_MEMBERS_PER_REQUEST).to_string();
        let url = self.endpoint(&format!("guilds/{guild_id}/members"), &[(
            "limit",
            limit.as_str(),
        )])?;
        self.get_json(url).await
    }

    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>> {
        let url = self.endpoint(&format!("guilds/{guild_id}/channels"), &[])?;
        self.get_json(url).await
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<Message>> {
        let limit = limit.clamp(1, MAX_MESSAGES_PER_REQUEST).to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(cursor) = before {
            query.push(("before", cursor));
        }
        let url = self.endpoint(&format!("channels/{channel_id}/messages"), &query)?;
        self.get_json(url).await
    }
}
