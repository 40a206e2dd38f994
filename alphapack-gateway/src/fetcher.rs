//! Paged channel-history retrieval with rate-limit backoff.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use alphapack_core::ChannelMessage;

/// Page size asked of the platform; Discord caps history pages at 100.
pub const PAGE_SIZE: u8 = 100;

/// Errors surfaced by history retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The platform asked us to slow down; the page can be retried.
    #[error("Rate limited by platform")]
    RateLimited,

    /// Retries for one page were exhausted.
    #[error("Rate-limit retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Any other platform failure; not retried.
    #[error("Platform error: {0}")]
    Platform(String),
}

/// One page of history, newest first, as platforms deliver it.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch up to `limit` messages older than `before` (or the newest
    /// messages when `before` is `None`).
    async fn page_before(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, FetchError>;
}

/// Retry policy for rate-limited pages.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubled on each further attempt.
    pub initial_delay: Duration,
    /// Total attempts per page, the initial request included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

/// Paged history fetcher over any [`HistorySource`].
pub struct MessageFetcher<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: HistorySource> MessageFetcher<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetch the complete channel history, oldest first.
    ///
    /// Pages backwards through history until an empty page. Each page is
    /// retried on rate limiting with exponential backoff; exhaustion or any
    /// other error propagates. The result is a finite snapshot; callers
    /// re-invoke to refetch.
    pub async fn fetch_all(&self, channel_id: u64) -> Result<Vec<ChannelMessage>, FetchError> {
        let mut messages: Vec<ChannelMessage> = Vec::new();
        let mut before: Option<u64> = None;

        loop {
            let page = self.fetch_page_with_retry(channel_id, before).await?;
            let Some(oldest) = page.last() else {
                break;
            };
            before = Some(oldest.id);
            messages.extend(page);
        }

        debug!(channel_id, count = messages.len(), "Fetched channel history");

        // Pages arrive newest first; counting wants chronological order.
        messages.reverse();
        Ok(messages)
    }

    async fn fetch_page_with_retry(
        &self,
        channel_id: u64,
        before: Option<u64>,
    ) -> Result<Vec<ChannelMessage>, FetchError> {
        let mut delay = self.retry.initial_delay;

        for attempt in 1..=self.retry.max_attempts {
            match self.source.page_before(channel_id, before, PAGE_SIZE).await {
                Ok(page) => return Ok(page),
                Err(FetchError::RateLimited) if attempt < self.retry.max_attempts => {
                    warn!(
                        channel_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited fetching history, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(FetchError::RateLimited) => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: self.retry.max_attempts,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.retry.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use chrono::Utc;

    fn msg(id: u64) -> ChannelMessage {
        ChannelMessage {
            id,
            channel_id: 1,
            guild_id: Some(1),
            author_id: 1,
            content: String::new(),
            attachment_urls: vec!["https://cdn.example/a.png".to_string()],
            created_at: Utc::now(),
        }
    }

    /// Scripted source: pops one response per call.
    struct Scripted {
        responses: Mutex<Vec<Result<Vec<ChannelMessage>, FetchError>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Vec<ChannelMessage>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl HistorySource for Scripted {
        async fn page_before(
            &self,
            _channel_id: u64,
            _before: Option<u64>,
            _limit: u8,
        ) -> Result<Vec<ChannelMessage>, FetchError> {
            self.responses
                .lock()
                .expect("lock")
                .remove(0)
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn pages_until_empty_and_returns_chronological() {
        let source = Scripted::new(vec![
            Ok(vec![msg(30), msg(20)]),
            Ok(vec![msg(10)]),
            Ok(vec![]),
        ]);
        let fetcher = MessageFetcher::new(source, fast_retry());

        let history = fetcher.fetch_all(1).await.expect("history");
        let ids: Vec<u64> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn rate_limited_page_is_retried_transparently() {
        let source = Scripted::new(vec![
            Err(FetchError::RateLimited),
            Ok(vec![msg(30), msg(20)]),
            Ok(vec![]),
        ]);
        let fetcher = MessageFetcher::new(source, fast_retry());

        let history = fetcher.fetch_all(1).await.expect("history");
        let ids: Vec<u64> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![20, 30]);
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_propagates() {
        let source = Scripted::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
        ]);
        let fetcher = MessageFetcher::new(source, fast_retry());

        let err = fetcher.fetch_all(1).await.expect_err("should exhaust");
        assert!(matches!(err, FetchError::RetriesExhausted { attempts: 3 }));
    }

    #[tokio::test]
    async fn other_errors_propagate_immediately() {
        let source = Scripted::new(vec![Err(FetchError::Platform("boom".to_string()))]);
        let fetcher = MessageFetcher::new(source, fast_retry());

        let err = fetcher.fetch_all(1).await.expect_err("should fail");
        assert!(matches!(err, FetchError::Platform(_)));
    }
}
