//! Feed retrieval: fetch an RSS document and turn it into display-ready articles.
//!
//! - `fetcher` - Single-attempt HTTP GET under a deadline, cancellable by the caller
//! - [`xml`] - Generic element tree with descendant lookups
//! - `parser` - Item mapping, description truncation, date normalization and ordering
//!
//! [`NewsFeedService`] ties these together behind [`ArticleSource`], whose
//! contract is that it never fails: every problem is logged and becomes an
//! empty list.
//!
//! # Example
//!
//! ```no_run
//! use newsfeed::config::FeedConfig;
//! use newsfeed::feed::{ArticleSource, NewsFeedService};
//!
//! # async fn example() -> Result<(), newsfeed::feed::FetchError> {
//! let service = NewsFeedService::new(FeedConfig::default())?;
//! let articles = service
//!     .get_articles("https://example.com/rss.xml", std::future::pending())
//!     .await;
//! for article in articles.iter() {
//!     println!("{}", article.title);
//! }
//! # Ok(())
//! # }
//! ```

mod fetcher;
mod parser;
pub mod xml;

pub use fetcher::{build_client, fetch_feed, FetchError};
pub use parser::{
    map_item, parse_articles, sort_newest_first, ArticleRecord, ItemError, MAX_FIELD_BYTES,
};
pub use xml::ParseError;

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::config::FeedConfig;

/// Everything that can stop a feed from producing articles.
///
/// Item-level problems are not here: those drop one item and keep the rest.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Malformed feed document: {0}")]
    Parse(#[from] ParseError),
}

/// Something that can list the articles of a feed.
///
/// Implementations must never fail: any error resolves to an empty list.
/// The returned slice is shared and immutable.
pub trait ArticleSource {
    /// Articles from `feed_url`, newest first.
    ///
    /// `cancel` aborts the network request when it completes. It has no
    /// effect once the body has been received.
    fn get_articles<C>(
        &self,
        feed_url: &str,
        cancel: C,
    ) -> impl Future<Output = Arc<[ArticleRecord]>> + Send
    where
        C: Future<Output = ()> + Send;
}

/// Fetches and parses feeds on demand. Holds no per-feed state.
///
/// Clones share one connection pool, so a single instance can serve many
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct NewsFeedService {
    client: reqwest::Client,
    config: Arc<FeedConfig>,
}

impl NewsFeedService {
    /// Builds a service with its own HTTP client.
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        let client = build_client(&config)?;
        Ok(Self::with_client(client, config))
    }

    /// Builds a service around an existing client.
    ///
    /// The configured deadline is still enforced per call regardless of how
    /// `client` was built.
    pub fn with_client(client: reqwest::Client, config: FeedConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// The same pipeline as [`ArticleSource::get_articles`], but reporting
    /// why nothing came back.
    pub async fn try_get_articles<C>(
        &self,
        feed_url: &str,
        cancel: C,
    ) -> Result<Vec<ArticleRecord>, FeedError>
    where
        C: Future<Output = ()>,
    {
        let body = fetch_feed(&self.client, feed_url, &self.config, cancel).await?;
        let articles = parse_articles(&body, self.config.description_limit)?;
        Ok(articles)
    }
}

impl ArticleSource for NewsFeedService {
    async fn get_articles<C>(&self, feed_url: &str, cancel: C) -> Arc<[ArticleRecord]>
    where
        C: Future<Output = ()> + Send,
    {
        match self.try_get_articles(feed_url, cancel).await {
            Ok(articles) => {
                tracing::debug!(url = %feed_url, count = articles.len(), "Fetched feed");
                articles.into()
            }
            Err(e) => {
                log_failure(feed_url, &e);
                Arc::from(Vec::new())
            }
        }
    }
}

fn log_failure(feed_url: &str, error: &FeedError) {
    match error {
        FeedError::Fetch(FetchError::InvalidUrl(e)) => {
            tracing::warn!(url = %feed_url, error = %e, "Feed URL is empty or invalid, skipping fetch");
        }
        FeedError::Fetch(FetchError::HttpStatus(status)) => {
            tracing::warn!(url = %feed_url, status = status, "Failed to fetch feed");
        }
        FeedError::Fetch(FetchError::Cancelled) => {
            tracing::warn!(url = %feed_url, "Feed fetch cancelled");
        }
        FeedError::Fetch(e) => {
            tracing::error!(url = %feed_url, error = %e, "Error fetching feed");
        }
        FeedError::Parse(e) => {
            tracing::error!(url = %feed_url, error = %e, "Error parsing feed");
        }
    }
}
