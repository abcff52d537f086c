use futures::StreamExt;
use std::future::Future;
use thiserror::Error;

use crate::config::FeedConfig;
use crate::util::{validate_url, UrlValidationError};

/// Errors that can occur while fetching a feed body.
///
/// Each call makes exactly one attempt, so every variant is final.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The feed URL was blank, unparsable, or rejected by policy.
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured deadline
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// The caller gave up before the body arrived
    #[error("Request cancelled")]
    Cancelled,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Builds the shared HTTP client.
///
/// `reqwest::Client` pools connections internally and is cheap to clone, so
/// one instance serves any number of concurrent fetches.
pub fn build_client(config: &FeedConfig) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetches a feed body in a single attempt.
///
/// The whole exchange (connect, headers, body) runs under the configured
/// deadline and is abandoned as soon as `cancel` completes, whichever comes
/// first. No retries are made.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `feed_url` - Feed address; validated before any network I/O
/// * `config` - Deadline, size limit and host policy
/// * `cancel` - Resolves when the caller wants to give up
///
/// # Errors
///
/// - [`FetchError::InvalidUrl`] - Blank or rejected URL (no request is made)
/// - [`FetchError::Timeout`] - Deadline elapsed
/// - [`FetchError::Cancelled`] - `cancel` completed first
/// - [`FetchError::HttpStatus`] - Non-2xx response
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::ResponseTooLarge`] / [`FetchError::IncompleteResponse`] - Body problems
pub async fn fetch_feed<C>(
    client: &reqwest::Client,
    feed_url: &str,
    config: &FeedConfig,
    cancel: C,
) -> Result<Vec<u8>, FetchError>
where
    C: Future<Output = ()>,
{
    let url = validate_url(feed_url)?;

    let request = get_body(client, url, config.max_feed_bytes);

    tokio::select! {
        result = tokio::time::timeout(config.timeout(), request) => {
            result.map_err(|_| FetchError::Timeout(config.timeout_secs))?
        }
        () = cancel => Err(FetchError::Cancelled),
    }
}

async fn get_body(
    client: &reqwest::Client,
    url: url::Url,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;

    // Single attempt: 4xx and 5xx both fail immediately
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, limit).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
