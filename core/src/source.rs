//! Proposal feed client.
//!
//! One GET per call, no retry and no pagination: the scheduler's next cycle
//! is the only retry mechanism.

use async_trait::async_trait;

use crate::errors::{Result, WatchError};
use crate::proposal::{Proposal, ProposalFeed};

/// Source of the current proposal set.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Fetch whatever the feed currently reports, in feed order.
    ///
    /// # Returns
    /// * `Err(WatchError::Fetch)` - transport failure or non-2xx status
    /// * `Err(WatchError::Parse)` - body is not a proposal envelope
    async fn fetch(&self) -> Result<Vec<Proposal>>;
}

/// Decode a feed response body.
pub fn parse_feed(body: &[u8]) -> Result<Vec<Proposal>> {
    let feed: ProposalFeed = serde_json::from_slice(body)
        .map_err(|e| WatchError::parse_with_source("feed body is not a proposal list", e))?;
    Ok(feed.proposals)
}

/// Feed client over HTTP.
pub struct HttpProposalSource {
    client: reqwest::Client,
    url: String,
}

impl HttpProposalSource {
    /// `client` is shared with the notifier so both carry the same timeout.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProposalSource for HttpProposalSource {
    async fn fetch(&self) -> Result<Vec<Proposal>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WatchError::fetch_with_source(format!("GET {} failed", self.url), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::fetch(format!("GET {} returned {status}", self.url)));
        }

        let body = resp.bytes().await.map_err(|e| {
            WatchError::fetch_with_source(format!("reading body from {} failed", self.url), e)
        })?;

        let proposals = parse_feed(&body)?;
        tracing::debug!(url = %self.url, count = proposals.len(), "Fetched proposal feed");
        Ok(proposals)
    }
}
