///! Relay feed client
///!
///! Fetches the raw JSON records of one relay feed. Parsing into entities
///! happens in [`super::parser`].

use async_trait::async_trait;
use mrn_common::{FeedKind, RawRecord};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {feed} failed: {source}")]
    Request {
        feed: FeedKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{feed} answered HTTP {status}")]
    Status { feed: FeedKind, status: StatusCode },

    #[error("{feed} body is not valid JSON: {source}")]
    Decode {
        feed: FeedKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{feed} body is not a list of records")]
    Shape { feed: FeedKind },
}

/// Source of raw feed records
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, kind: FeedKind) -> Result<Vec<RawRecord>, FetchError>;
}

/// Fetches feeds from the public relay RSS API over HTTP
pub struct HttpFeedSource {
    client: Client,
    base_url: String,
}

impl HttpFeedSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn feed_url(&self, kind: FeedKind) -> String {
        format!(
            "{}?feed={}&category=all&feedtype=json",
            self.base_url,
            kind.as_str()
        )
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, kind: FeedKind) -> Result<Vec<RawRecord>, FetchError> {
        let url = self.feed_url(kind);
        tracing::debug!("Fetching {} feed from {}", kind, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request { feed: kind, source })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                feed: kind,
                status: response.status(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| FetchError::Decode { feed: kind, source })?;

        let records = extract_records(body).ok_or(FetchError::Shape { feed: kind })?;
        tracing::debug!("Fetched {} raw records from {} feed", records.len(), kind);

        Ok(records)
    }
}

/// Pull the record list out of a feed body.
///
/// Accepts either a bare JSON array or an object wrapping it in `items`.
fn extract_records(body: Value) -> Option<Vec<RawRecord>> {
    match body {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(records)) => Some(records),
            _ => None,
        },
        _ => None,
    }
}
