//! # Financial News Posts
//!
//! A batch pipeline that harvests financial headlines, keeps the most
//! engaging story of each source, and turns it into a scheduled social post
//! with an image card.
//!
//! ## Features
//!
//! - Fetches headlines from CNBC, Yahoo News and the Financial Times (RSS)
//!   and Bloomberg (HTML scraping with a fixed-delay retry)
//! - Scores stories by engagement and keeps the best story per source
//! - Assigns the next of three daily publication slots
//! - Writes each post through an OpenAI-compatible LLM API and renders a
//!   headline card
//! - Outputs JSON snapshots and a dashboard summary
//!
//! ## Usage
//!
//! ```sh
//! fin_news_posts -o ./out
//! ```
//!
//! ## Architecture
//!
//! The application runs two stages:
//! 1. **Fetch**: Fetch every source, select the top stories and commit `top_stories.json`
//! 2. **Rewrite**: Generate posts and image cards, write `final_posts.json` and `dashboard.json`
//!
//! The rewrite stage starts only after the fetch stage has committed.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod engagement;
mod error;
mod models;
mod outputs;
mod pipeline;
mod render;
mod scrapers;
mod selector;
mod utils;

use api::OpenAiCopyWriter;
use cli::{Cli, Stage};
use engagement::{EngagementModel, FixedEngagement, RandomEngagement};
use pipeline::{OutputPaths, default_fetchers, run_dashboard_stage, run_fetch_stage, run_rewrite_stage};
use render::{CardFont, HeadlineCard};
use scrapers::HttpLoader;
use utils::{current_schedule_slot, ensure_writable_dir};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // Credentials may live in .env; a missing file is fine.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(
        started_at = %chrono::Local::now().format("%Y-%m-%d %H:%M"),
        "fin_news_posts starting up"
    );
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file"),
        Err(e) => warn!(error = %e, "Ignoring unreadable .env"),
    }

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.stage, limit = args.limit, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let paths = OutputPaths::in_dir(&args.output_dir);
    let timeout = Duration::from_secs(args.timeout_secs);

    let mut ok = true;

    // ---- Fetch stage ----
    if matches!(args.stage, Stage::All | Stage::Fetch) {
        let engagement: Arc<dyn EngagementModel> = match args.fixed_engagement {
            Some(counts) => Arc::new(FixedEngagement(counts)),
            None => Arc::new(RandomEngagement),
        };
        let loader = Arc::new(HttpLoader::new(timeout)?);
        let fetchers = default_fetchers(
            loader,
            engagement,
            args.max_retries,
            Duration::from_secs(args.retry_delay_secs),
        );
        let slot = current_schedule_slot();

        match run_fetch_stage(&fetchers, args.limit, &slot, &paths).await {
            Ok(outcome) => info!(
                stories = outcome.report.stories.len(),
                failed_sources = outcome.report.failures.len(),
                top_stories = outcome.top_stories.len(),
                slot = %outcome.slot,
                "Fetch stage committed"
            ),
            Err(e) => {
                error!(error = %e, "Fetch stage failed; skipping rewrite");
                ok = false;
            }
        }
    }

    // ---- Rewrite stage ----
    if ok && matches!(args.stage, Stage::All | Stage::Rewrite) {
        let writer = OpenAiCopyWriter::new(
            args.openai_base_url.clone(),
            args.openai_api_key.clone(),
            args.model.clone(),
            timeout,
        )?;
        if args.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; posts will carry the failure text");
        }
        let card = HeadlineCard::new(CardFont::load(&args.font), &paths.images);

        match run_rewrite_stage(&writer, &card, &paths).await {
            Ok(posts) => info!(count = posts.len(), "Rewrite stage complete"),
            Err(e) => {
                error!(error = %e, "Rewrite stage failed");
                ok = false;
            }
        }
    }

    // ---- Dashboard ----
    if ok && matches!(args.stage, Stage::All | Stage::Rewrite | Stage::Dashboard) {
        if let Err(e) = run_dashboard_stage(&paths).await {
            error!(error = %e, "Dashboard generation failed");
            if args.stage == Stage::Dashboard {
                ok = false;
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        success = ok,
        "Execution complete"
    );

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
