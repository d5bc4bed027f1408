//! The two pipeline stages and the hand-off between them.
//!
//! 1. **Fetch stage**: run every source fetcher, persist all stories, select the
//!    best story per source, stamp the publication slot and commit
//!    `top_stories.json`.
//! 2. **Rewrite stage**: reload the committed top stories, generate a social
//!    post and an image card for each, persist `final_posts.json` and build
//!    the dashboard.
//!
//! The rewrite stage only runs after the fetch stage has committed its output.

use crate::api::{CopyWriter, generate_social_post};
use crate::engagement::EngagementModel;
use crate::error::PipelineError;
use crate::models::{FinalPost, Story, TopStory};
use crate::outputs::dashboard::{DashboardReport, generate_dashboard};
use crate::outputs::json::{
    DASHBOARD, FINAL_POSTS, RECENT_STORIES, TOP_STORIES, read_snapshot, write_snapshot,
};
use crate::render::{HeadlineCard, reset_dir};
use crate::scrapers::bloomberg::BloombergFetcher;
use crate::scrapers::feeds::RssFetcher;
use crate::scrapers::{FetchReport, NewsFetcher, PageLoader, fetch_all};
use crate::selector::{schedule_top_stories, select_top_per_source};
use crate::utils::now_stamp;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Locations of every artifact the pipeline reads or writes.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub recent_stories: PathBuf,
    pub top_stories: PathBuf,
    pub final_posts: PathBuf,
    pub dashboard: PathBuf,
    pub images: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            recent_stories: dir.join(RECENT_STORIES),
            top_stories: dir.join(TOP_STORIES),
            final_posts: dir.join(FINAL_POSTS),
            dashboard: dir.join(DASHBOARD),
            images: dir.join("images"),
        }
    }
}

/// Build the default fetchers, in publication order.
pub fn default_fetchers(
    loader: Arc<dyn PageLoader>,
    engagement: Arc<dyn EngagementModel>,
    max_retries: usize,
    retry_delay: Duration,
) -> Vec<Box<dyn NewsFetcher>> {
    vec![
        Box::new(RssFetcher::cnbc(loader.clone(), engagement.clone())),
        Box::new(RssFetcher::yahoo_news(loader.clone(), engagement.clone())),
        Box::new(RssFetcher::financial_times(loader.clone(), engagement.clone())),
        Box::new(BloombergFetcher::new(
            loader,
            engagement,
            max_retries,
            retry_delay,
        )),
    ]
}

/// What the fetch stage committed.
#[derive(Debug)]
pub struct FetchOutcome {
    pub report: FetchReport,
    pub top_stories: Vec<TopStory>,
    pub slot: String,
}

/// Fetch, select and commit the top stories.
///
/// A failure to write `recent_stories.json` is logged and tolerated; a
/// failure to write `top_stories.json` aborts the stage.
#[instrument(level = "info", skip_all, fields(limit = limit, slot = %slot))]
pub async fn run_fetch_stage(
    fetchers: &[Box<dyn NewsFetcher>],
    limit: usize,
    slot: &str,
    paths: &OutputPaths,
) -> Result<FetchOutcome, PipelineError> {
    let report = fetch_all(fetchers, limit).await;

    if let Err(e) = write_snapshot(&paths.recent_stories, &report.stories).await {
        error!(error = %e, "Failed to save recent stories");
    }

    let top_stories = schedule_top_stories(select_top_per_source(&report.stories), slot);
    write_snapshot(&paths.top_stories, &top_stories)
        .await
        .map_err(PipelineError::Commit)?;
    info!(count = top_stories.len(), %slot, "Committed top stories");

    Ok(FetchOutcome {
        report,
        top_stories,
        slot: slot.to_string(),
    })
}

/// Turn one top story into a final post.
///
/// Text and image failures only affect their own field.
pub async fn build_final_post<W: CopyWriter>(
    top: &TopStory,
    writer: &W,
    card: &HeadlineCard,
) -> FinalPost {
    let story: &Story = &top.story;
    let social_post = generate_social_post(writer, story).await;
    let image_asset = match card.render(&story.title).await {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            warn!(title = %story.title, error = %e, "Image card failed");
            String::new()
        }
    };
    let scheduled_time = top.scheduled_time.clone().unwrap_or_else(now_stamp);

    info!(
        source = %story.source,
        title = %story.title,
        subhead = story.subhead.as_deref().unwrap_or_default(),
        url = %story.url,
        post = %social_post,
        image = %image_asset,
        "Prepared post"
    );

    FinalPost {
        source: story.source,
        title: story.title.clone(),
        subhead: story.subhead.clone().unwrap_or_default(),
        url: story.url.clone(),
        social_post,
        image_asset,
        scheduled_time,
        engagement: story.engagement,
    }
}

/// Reload the committed top stories and produce the final posts.
///
/// The images directory is reset first. A missing or unreadable
/// `top_stories.json` stops the stage before anything else is written.
#[instrument(level = "info", skip_all)]
pub async fn run_rewrite_stage<W: CopyWriter>(
    writer: &W,
    card: &HeadlineCard,
    paths: &OutputPaths,
) -> Result<Vec<FinalPost>, PipelineError> {
    reset_dir(card.dir()).await.map_err(PipelineError::Images)?;

    let top_stories: Vec<TopStory> = read_snapshot(&paths.top_stories)
        .await
        .map_err(PipelineError::Handoff)?;

    let mut posts = Vec::with_capacity(top_stories.len());
    for top in &top_stories {
        posts.push(build_final_post(top, writer, card).await);
    }

    write_snapshot(&paths.final_posts, &posts)
        .await
        .map_err(PipelineError::FinalPosts)?;
    info!(count = posts.len(), path = %paths.final_posts.display(), "All posts saved");
    Ok(posts)
}

/// Build `dashboard.json` from `final_posts.json`.
pub async fn run_dashboard_stage(paths: &OutputPaths) -> Result<DashboardReport, PipelineError> {
    generate_dashboard(&paths.final_posts, &paths.dashboard)
        .await
        .map_err(PipelineError::Dashboard)
}
