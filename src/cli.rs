//! Command-line interface definitions.
//!
//! All options can be provided via command-line flags or environment
//! variables; a `.env` file in the working directory is loaded first.

use crate::models::Engagement;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which part of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    /// Fetch stage, then rewrite stage and dashboard once top stories are committed
    All,
    /// Fetch, select and commit `top_stories.json` only
    Fetch,
    /// Rewrite the committed top stories and build the dashboard
    Rewrite,
    /// Rebuild `dashboard.json` from `final_posts.json`
    Dashboard,
}

/// Command-line arguments for the financial news post generator.
///
/// # Examples
///
/// ```sh
/// # Full run into ./out
/// fin_news_posts -o ./out
///
/// # Only refresh the top stories, deterministic engagement
/// fin_news_posts --stage fetch --fixed-engagement 100,20,10
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for the JSON snapshots and the images folder
    #[arg(short, long, env = "FIN_NEWS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Pipeline stage to run
    #[arg(short, long, value_enum, default_value_t = Stage::All)]
    pub stage: Stage,

    /// Maximum stories fetched per source
    #[arg(short, long, default_value_t = 5)]
    pub limit: usize,

    /// Attempts made against Bloomberg before giving up on an empty page
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// Seconds to wait between Bloomberg attempts
    #[arg(long, default_value_t = 5)]
    pub retry_delay_secs: u64,

    /// HTTP timeout in seconds for source and model requests
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// API key for the text model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Model used to write the social posts
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// TrueType font for the image cards (falls back to a built-in bitmap font)
    #[arg(long, env = "FIN_NEWS_FONT", default_value = "arial.ttf")]
    pub font: PathBuf,

    /// Use fixed engagement counters `LIKES,SHARES,COMMENTS` instead of random ones
    #[arg(long, value_parser = parse_engagement)]
    pub fixed_engagement: Option<Engagement>,
}

fn parse_engagement(raw: &str) -> Result<Engagement, String> {
    let counts = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>().map_err(|e| format!("`{}`: {}", part, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match counts.as_slice() {
        [likes, shares, comments] => Ok(Engagement::new(*likes, *shares, *comments)),
        _ => Err("expected LIKES,SHARES,COMMENTS".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["fin_news_posts"]);

        assert_eq!(cli.stage, Stage::All);
        assert_eq!(cli.limit, 5);
        assert_eq!(cli.max_retries, 3);
        assert_eq!(cli.retry_delay_secs, 5);
        assert_eq!(cli.timeout_secs, 10);
        assert!(cli.fixed_engagement.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["fin_news_posts", "-o", "/tmp/out", "-s", "rewrite", "-l", "2"]);

        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cli.stage, Stage::Rewrite);
        assert_eq!(cli.limit, 2);
    }

    #[test]
    fn test_cli_fixed_engagement() {
        let cli = Cli::parse_from(["fin_news_posts", "--fixed-engagement", "100, 20,10"]);
        assert_eq!(cli.fixed_engagement, Some(Engagement::new(100, 20, 10)));
    }

    #[test]
    fn test_cli_rejects_bad_engagement() {
        assert!(Cli::try_parse_from(["fin_news_posts", "--fixed-engagement", "1,2"]).is_err());
        assert!(Cli::try_parse_from(["fin_news_posts", "--fixed-engagement", "a,b,c"]).is_err());
    }
}
