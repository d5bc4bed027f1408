//! News source fetchers and the orchestrator that runs them.
//!
//! Each fetcher targets one outlet and returns at most `limit` normalized
//! [`Story`] records:
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | CNBC | [`feeds`] | RSS | Top news feed |
//! | Yahoo News | [`feeds`] | RSS | |
//! | Financial Times | [`feeds`] | RSS | Markets feed, browser user agent |
//! | Bloomberg | [`bloomberg`] | HTML scraping | Retries with a fixed delay on empty pages |
//!
//! # Common Patterns
//!
//! - Pages are retrieved through a [`PageLoader`] so fixtures can stand in for HTTP
//! - Engagement counters come from an injected [`EngagementModel`]
//! - [`fetch_all`] isolates failures: a broken source is logged and contributes nothing
//!
//! [`EngagementModel`]: crate::engagement::EngagementModel

pub mod bloomberg;
pub mod feeds;

use crate::error::{FetchError, FetchFailure};
use crate::models::{Source, Story};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Retrieves the body of a web page.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str, user_agent: Option<&str>) -> Result<String, FetchError>;
}

/// [`PageLoader`] backed by a shared `reqwest` client with a request timeout.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoader for HttpLoader {
    #[instrument(level = "debug", skip(self))]
    async fn load(&self, url: &str, user_agent: Option<&str>) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(agent) = user_agent {
            request = request.header(reqwest::header::USER_AGENT, agent);
        }
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }
}

/// A single news source.
#[async_trait]
pub trait NewsFetcher: Send + Sync {
    fn source(&self) -> Source;

    /// Fetch at most `limit` stories.
    async fn fetch(&self, limit: usize) -> Result<Vec<Story>, FetchError>;
}

/// Outcome of running every fetcher once.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub stories: Vec<Story>,
    pub failures: Vec<FetchFailure>,
}

/// Run every fetcher in order and concatenate their stories.
///
/// A failing fetcher contributes no stories; its error is logged with the
/// source label and kept in [`FetchReport::failures`].
#[instrument(level = "info", skip_all, fields(fetchers = fetchers.len(), limit = limit))]
pub async fn fetch_all(fetchers: &[Box<dyn NewsFetcher>], limit: usize) -> FetchReport {
    let results: Vec<(Source, Result<Vec<Story>, FetchError>)> = stream::iter(fetchers)
        .then(|fetcher| async move { (fetcher.source(), fetcher.fetch(limit).await) })
        .collect()
        .await;

    let mut report = FetchReport::default();
    for (source, result) in results {
        match result {
            Ok(stories) => {
                if stories.is_empty() {
                    warn!(%source, "Source returned no stories");
                } else {
                    info!(%source, count = stories.len(), "Fetched stories");
                }
                report.stories.extend(stories);
            }
            Err(e) => {
                error!(%source, error = %e, "Error fetching source");
                report.failures.push(FetchFailure { source, error: e });
            }
        }
    }

    info!(
        total = report.stories.len(),
        failed_sources = report.failures.len(),
        "Fetch complete"
    );
    report
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Engagement;

    struct StaticFetcher {
        source: Source,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl NewsFetcher for StaticFetcher {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
            Ok(self
                .titles
                .iter()
                .take(limit)
                .map(|t| Story {
                    source: self.source,
                    title: t.to_string(),
                    subhead: None,
                    url: format!("https://example.com/{}", t),
                    engagement: Engagement::default(),
                })
                .collect())
        }
    }

    struct BrokenFetcher(Source);

    #[async_trait]
    impl NewsFetcher for BrokenFetcher {
        fn source(&self) -> Source {
            self.0
        }

        async fn fetch(&self, _limit: usize) -> Result<Vec<Story>, FetchError> {
            Err(FetchError::Other("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let fetchers: Vec<Box<dyn NewsFetcher>> = vec![
            Box::new(StaticFetcher {
                source: Source::Cnbc,
                titles: vec!["c1", "c2"],
            }),
            Box::new(BrokenFetcher(Source::YahooNews)),
            Box::new(StaticFetcher {
                source: Source::Bloomberg,
                titles: vec!["b1"],
            }),
        ];

        let report = fetch_all(&fetchers, 5).await;

        let titles: Vec<_> = report.stories.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["c1", "c2", "b1"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, Source::YahooNews);
        assert!(report.failures[0].error.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_fetch_all_passes_limit() {
        let fetchers: Vec<Box<dyn NewsFetcher>> = vec![Box::new(StaticFetcher {
            source: Source::Cnbc,
            titles: vec!["1", "2", "3", "4"],
        })];
        let report = fetch_all(&fetchers, 2).await;
        assert_eq!(report.stories.len(), 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_with_every_source_failing() {
        let fetchers: Vec<Box<dyn NewsFetcher>> = vec![
            Box::new(BrokenFetcher(Source::Cnbc)),
            Box::new(BrokenFetcher(Source::FinancialTimes)),
        ];
        let report = fetch_all(&fetchers, 5).await;
        assert!(report.stories.is_empty());
        let failed: Vec<_> = report.failures.iter().map(|f| f.source).collect();
        assert_eq!(failed, vec![Source::Cnbc, Source::FinancialTimes]);
    }
}
