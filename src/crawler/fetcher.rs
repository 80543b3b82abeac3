//! Rate-limited page fetching

use std::future::Future;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use tracing::{Instrument, debug, debug_span, instrument};

use super::config::CrawlerConfig;
use super::error::FetchError;
use crate::error::{Error, Result};

/// Anything that can turn a page URL into markup
///
/// The pipeline only talks to this trait, so runs can be replayed against
/// stored markup.
pub trait PageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = std::result::Result<String, FetchError>> + Send;
}

/// HTTP fetcher that spaces out request start times
///
/// A single-cell quota means no two fetches from the same fetcher start closer
/// together than the configured period, regardless of how long each takes.
pub struct HttpFetcher {
    client: ReqwestClient,
    limiter: DefaultDirectRateLimiter,
}

impl HttpFetcher {
    /// Build a fetcher from crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let quota = Quota::with_period(config.rate_limit()).ok_or_else(|| {
            Error::Config("delay between requests must be positive".to_string())
        })?;
        let limiter = RateLimiter::direct(quota);

        Ok(Self { client, limiter })
    }
}

impl PageSource for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;

        debug!("Sending GET request to {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let body = String::from_utf8(bytes.to_vec()).map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: format!("not valid UTF-8: {}", e),
        })?;

        if body.trim().is_empty() {
            return Err(FetchError::Body {
                url: url.to_string(),
                reason: "empty body".to_string(),
            });
        }

        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
