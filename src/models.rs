//! Data models for harvested stories and the records derived from them.
//!
//! This module defines the records that flow through the pipeline:
//! - [`Story`]: a headline as produced by a source fetcher
//! - [`TopStory`]: the best story of a source, with its publication slot
//! - [`FinalPost`]: a top story with generated copy and an image card
//! - [`DashboardRow`]: a flattened reporting view of a final post
//!
//! Field names match the JSON snapshots written to disk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The news sources the pipeline harvests, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Source {
    #[serde(rename = "CNBC")]
    Cnbc,
    #[serde(rename = "Yahoo News")]
    YahooNews,
    #[serde(rename = "Financial Times")]
    FinancialTimes,
    #[serde(rename = "Bloomberg")]
    Bloomberg,
}

impl Source {
    /// Human-readable label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Source::Cnbc => "CNBC",
            Source::YahooNews => "Yahoo News",
            Source::FinancialTimes => "Financial Times",
            Source::Bloomberg => "Bloomberg",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Engagement counters attached to a story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Engagement {
    pub likes: u32,
    pub shares: u32,
    pub comments: u32,
}

impl Engagement {
    pub fn new(likes: u32, shares: u32, comments: u32) -> Self {
        Self {
            likes,
            shares,
            comments,
        }
    }
}

/// A single headline as harvested from a source.
///
/// `source`, `title` and `url` are always present. `engagement` is assigned
/// once at fetch time; readers of older snapshots get zeros when it is missing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Story {
    pub source: Source,
    pub title: String,
    pub subhead: Option<String>,
    pub url: String,
    #[serde(default)]
    pub engagement: Engagement,
}

/// The highest-scoring story of a source, enriched with its publication slot.
///
/// Serialized flat: the story fields and `scheduled_time` share one object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopStory {
    #[serde(flatten)]
    pub story: Story,
    #[serde(default)]
    pub scheduled_time: Option<String>,
}

impl TopStory {
    pub fn new(story: Story, scheduled_time: impl Into<String>) -> Self {
        Self {
            story,
            scheduled_time: Some(scheduled_time.into()),
        }
    }
}

/// A top story rewritten into a social post with its image card.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FinalPost {
    pub source: Source,
    pub title: String,
    pub subhead: String,
    pub url: String,
    pub social_post: String,
    pub image_asset: String,
    pub scheduled_time: String,
    pub engagement: Engagement,
}

/// Flattened reporting view of a [`FinalPost`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardRow {
    pub source: String,
    pub title: String,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub scheduled_time: Option<String>,
    pub image: String,
    pub post: String,
}
