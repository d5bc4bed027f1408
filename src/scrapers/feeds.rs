//! RSS feed fetchers for CNBC, Yahoo News and the Financial Times.
//!
//! All three outlets publish RSS 2.0, so one [`RssFetcher`] handles them; the
//! per-outlet constructors only differ in feed URL and request headers.
//!
//! # Field Mapping
//!
//! | RSS | Story |
//! |-----|-------|
//! | `title` | `title` |
//! | `description` | `subhead` (tags stripped, absent when empty) |
//! | `link` | `url` |

use crate::engagement::EngagementModel;
use crate::error::FetchError;
use crate::models::{Source, Story};
use crate::scrapers::{NewsFetcher, PageLoader};
use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const CNBC_FEED_URL: &str = "https://www.cnbc.com/id/100003114/device/rss/rss.html";
pub const YAHOO_FEED_URL: &str = "https://www.yahoo.com/news/rss";
pub const FT_FEED_URL: &str = "https://www.ft.com/rss/markets";

const FT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Fetches the newest items of one RSS feed.
pub struct RssFetcher {
    source: Source,
    url: String,
    user_agent: Option<&'static str>,
    loader: Arc<dyn PageLoader>,
    engagement: Arc<dyn EngagementModel>,
}

impl RssFetcher {
    pub fn new(
        source: Source,
        url: impl Into<String>,
        loader: Arc<dyn PageLoader>,
        engagement: Arc<dyn EngagementModel>,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            user_agent: None,
            loader,
            engagement,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &'static str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn cnbc(loader: Arc<dyn PageLoader>, engagement: Arc<dyn EngagementModel>) -> Self {
        Self::new(Source::Cnbc, CNBC_FEED_URL, loader, engagement)
    }

    pub fn yahoo_news(loader: Arc<dyn PageLoader>, engagement: Arc<dyn EngagementModel>) -> Self {
        Self::new(Source::YahooNews, YAHOO_FEED_URL, loader, engagement)
    }

    pub fn financial_times(
        loader: Arc<dyn PageLoader>,
        engagement: Arc<dyn EngagementModel>,
    ) -> Self {
        Self::new(Source::FinancialTimes, FT_FEED_URL, loader, engagement)
            .with_user_agent(FT_USER_AGENT)
    }

    fn parse(&self, xml: &str, limit: usize) -> Result<Vec<Story>, FetchError> {
        let rss: Rss = from_str(&scrub_html_entities(xml)).map_err(|e| FetchError::Feed {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        let stories = rss
            .channel
            .items
            .into_iter()
            .take(limit)
            .filter_map(|item| {
                let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
                let url = item.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
                Some(Story {
                    source: self.source,
                    title,
                    subhead: item.description.as_deref().and_then(clean_summary),
                    url,
                    engagement: self.engagement.sample(),
                })
            })
            .collect();
        Ok(stories)
    }
}

#[async_trait]
impl NewsFetcher for RssFetcher {
    fn source(&self) -> Source {
        self.source
    }

    #[instrument(level = "info", skip(self), fields(source = %self.source, url = %self.url))]
    async fn fetch(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let body = self.loader.load(&self.url, self.user_agent).await?;
        debug!(bytes = body.len(), "Downloaded feed");
        let stories = self.parse(&body, limit)?;
        if stories.is_empty() {
            info!("No stories found in feed");
        }
        Ok(stories)
    }
}

static BREAKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6])\s*>").expect("static regex")
});
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("static regex"));

const XML_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Strip markup from a feed summary and collapse its whitespace.
///
/// Line breaks and block ends separate words; inline tags vanish.
fn clean_summary(raw: &str) -> Option<String> {
    let text = BREAKS.replace_all(raw, " ");
    let text = TAGS.replace_all(&text, "");
    let collapsed = text.split_whitespace().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Rewrite named HTML entities that XML does not define.
///
/// Known entities are decoded (and re-escaped when they decode to markup
/// characters); unknown ones are kept as literal text.
fn scrub_html_entities(xml: &str) -> Cow<'_, str> {
    NAMED_ENTITY.replace_all(xml, |caps: &Captures| {
        let (entity, name) = (&caps[0], &caps[1]);
        if XML_ENTITIES.contains(&name) {
            return entity.to_string();
        }
        let decoded = html_escape::decode_html_entities(entity);
        if decoded == entity {
            format!("&amp;{};", name)
        } else {
            html_escape::encode_safe(&decoded.replace('\u{a0}', " ")).into_owned()
        }
    })
}
