//! JSON snapshot persistence.
//!
//! Every stage writes its output as a pretty-printed JSON array so the next
//! stage (or a human) can pick it up:
//! ```text
//! output_dir/
//! ├── recent_stories.json
//! ├── top_stories.json
//! ├── final_posts.json
//! └── dashboard.json
//! ```

use crate::error::PersistError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

pub const RECENT_STORIES: &str = "recent_stories.json";
pub const TOP_STORIES: &str = "top_stories.json";
pub const FINAL_POSTS: &str = "final_posts.json";
pub const DASHBOARD: &str = "dashboard.json";

/// Serialize `records` as a pretty-printed JSON array and write it to `path`.
///
/// The parent directory is created when missing.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_snapshot<T: Serialize>(path: &Path, records: &[T]) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(records).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create snapshot dir");
            return Err(PersistError::Io {
                path: parent.to_path_buf(),
                source: e,
            });
        }
    }

    fs::write(path, json)
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Wrote snapshot");
    Ok(())
}

/// Read a JSON array snapshot from `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PersistError> {
    let bytes = fs::read(path).await.map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<T> = serde_json::from_slice(&bytes).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(count = records.len(), "Read snapshot");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engagement, Source, Story, TopStory};

    fn top_stories() -> Vec<TopStory> {
        vec![
            TopStory::new(
                Story {
                    source: Source::Cnbc,
                    title: "Dow jumps 300 points".to_string(),
                    subhead: Some("Tech leads the way".to_string()),
                    url: "https://www.cnbc.com/dow".to_string(),
                    engagement: Engagement::new(300, 40, 12),
                },
                "2025-05-06 12:30",
            ),
            TopStory::new(
                Story {
                    source: Source::FinancialTimes,
                    title: "Société Générale beats forecasts".to_string(),
                    subhead: None,
                    url: "https://www.ft.com/content/sg".to_string(),
                    engagement: Engagement::new(60, 11, 6),
                },
                "2025-05-06 12:30",
            ),
        ]
    }

    #[tokio::test]
    async fn test_top_stories_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(TOP_STORIES);
        let stories = top_stories();

        write_snapshot(&path, &stories).await.unwrap();
        let back: Vec<TopStory> = read_snapshot(&path).await.unwrap();

        assert_eq!(back, stories);
    }

    #[tokio::test]
    async fn test_snapshot_is_pretty_utf8_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(TOP_STORIES);

        write_snapshot(&path, &top_stories()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n  {"));
        assert!(text.contains("Société Générale"));
        assert!(text.contains("\"scheduled_time\": \"2025-05-06 12:30\""));
    }

    #[tokio::test]
    async fn test_read_missing_snapshot_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_snapshot::<TopStory>(&tmp.path().join(TOP_STORIES))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }

    #[tokio::test]
    async fn test_read_corrupt_snapshot_is_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(TOP_STORIES);
        std::fs::write(&path, "[{\"source\": ").unwrap();
        let err = read_snapshot::<TopStory>(&path).await.unwrap_err();
        assert!(matches!(err, PersistError::Json { .. }));
    }
}
