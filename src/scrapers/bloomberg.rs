//! Bloomberg Markets headline scraper.
//!
//! Bloomberg has no public feed, so headlines are scraped from the markets
//! landing page. The page is often served empty, or refused with an HTTP error
//! status, to automated clients. Both count as an empty attempt, which is
//! retried after a fixed delay up to a hard attempt ceiling. Transport
//! failures are not retried.
//!
//! # URL Pattern
//!
//! Story links are relative (`/news/articles/...`) and are resolved against
//! `https://www.bloomberg.com`.

use crate::engagement::EngagementModel;
use crate::error::FetchError;
use crate::models::{Source, Story};
use crate::scrapers::{NewsFetcher, PageLoader};
use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use rand::rng;
use rand::seq::IndexedRandom;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const MARKETS_URL: &str = "https://www.bloomberg.com/markets";
const BASE_URL: &str = "https://www.bloomberg.com";
const STORY_LINKS: &str = r#"a[href^="/news/articles/"], a[data-tracking-name="Story Link"]"#;

static STORY_SELECTOR: Lazy<Result<Selector, String>> =
    Lazy::new(|| Selector::parse(STORY_LINKS).map_err(|e| e.to_string()));
static BASE: Lazy<Result<Url, url::ParseError>> = Lazy::new(|| Url::parse(BASE_URL));

const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (X11; Linux x86_64)",
];

/// Scrapes the Bloomberg markets page with a fixed-delay retry on empty results.
pub struct BloombergFetcher {
    loader: Arc<dyn PageLoader>,
    engagement: Arc<dyn EngagementModel>,
    max_retries: usize,
    retry_delay: Duration,
}

impl BloombergFetcher {
    /// Create a fetcher making at most `max_retries` attempts, `retry_delay` apart.
    pub fn new(
        loader: Arc<dyn PageLoader>,
        engagement: Arc<dyn EngagementModel>,
        max_retries: usize,
        retry_delay: Duration,
    ) -> Self {
        Self {
            loader,
            engagement,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Extract up to `limit` stories with distinct titles from a markets page.
    fn extract(&self, html: &str, limit: usize) -> Result<Vec<Story>, FetchError> {
        let selector = STORY_SELECTOR
            .as_ref()
            .map_err(|message| FetchError::Selector {
                selector: STORY_LINKS.to_string(),
                message: message.clone(),
            })?;
        let base = BASE
            .as_ref()
            .map_err(|e| FetchError::Other(e.to_string()))?;
        let document = Html::parse_document(html);

        let mut stories = Vec::new();
        let mut seen_titles = HashSet::new();
        for link in document.select(selector) {
            if stories.len() >= limit {
                break;
            }
            let title = link.text().flat_map(str::split_whitespace).join(" ");
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if title.is_empty() || href.is_empty() || seen_titles.contains(&title) {
                continue;
            }
            let url = match base.join(href) {
                Ok(resolved) => resolved.to_string(),
                Err(e) => {
                    debug!(%href, error = %e, "Skipping unresolvable link");
                    continue;
                }
            };

            seen_titles.insert(title.clone());
            stories.push(Story {
                source: Source::Bloomberg,
                title,
                subhead: None,
                url,
                engagement: self.engagement.sample(),
            });
        }
        Ok(stories)
    }
}

#[async_trait]
impl NewsFetcher for BloombergFetcher {
    fn source(&self) -> Source {
        Source::Bloomberg
    }

    #[instrument(level = "info", skip(self), fields(max_retries = self.max_retries))]
    async fn fetch(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let mut attempt = 1;
        loop {
            let user_agent = USER_AGENTS.choose(&mut rng()).copied();
            let stories = match self.loader.load(MARKETS_URL, user_agent).await {
                Ok(html) => self.extract(&html, limit)?,
                Err(FetchError::Status { status, .. }) => {
                    warn!(attempt, status, "Bloomberg refused the request");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            if !stories.is_empty() || attempt >= self.max_retries {
                info!(attempt, count = stories.len(), "Scraped Bloomberg headlines");
                return Ok(stories);
            }

            warn!(attempt, delay = ?self.retry_delay, "Bloomberg returned no stories; retrying");
            sleep(self.retry_delay).await;
            attempt += 1;
        }
    }
}
