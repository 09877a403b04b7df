use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::feed::errors::FeedError;
use crate::feed::parser::{FetchOutcome, parse_ticks};
use crate::feed::source::TickSource;

pub const DEFAULT_FEED_URL: &str = "http://webrates.truefx.com/rates/connect.html?f=csv";

#[derive(Clone)]
pub struct FeedClient {
    http: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }

    /// GET the feed and return the raw body.
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    pub async fn fetch_raw(&self) -> Result<Vec<u8>, FeedError> {
        let resp = self.http.get(&self.url).send().await?.error_for_status()?;

        let body = resp.bytes().await?;

        debug!(bytes = body.len(), "feed payload fetched");

        Ok(body.to_vec())
    }
}

#[async_trait]
impl TickSource for FeedClient {
    async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        let body = self.fetch_raw().await?;
        parse_ticks(&body)
    }
}
