//! Dashboard projection of the final posts.
//!
//! The dashboard is a flat, read-only view: one row per post with the
//! engagement counters lifted to the top level. Missing counters and a missing
//! `scheduled_time` are tolerated; a record without its identifying fields is
//! rejected and reported instead of being dropped silently.

use crate::error::PersistError;
use crate::models::DashboardRow;
use crate::outputs::json::{read_snapshot, write_snapshot};
use serde_json::Value;
use std::path::Path;
use tracing::{info, instrument, warn};

/// A final-post record that could not be projected.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: String,
}

/// Rows built from the final posts plus the records that were rejected.
#[derive(Debug, Default)]
pub struct DashboardReport {
    pub rows: Vec<DashboardRow>,
    pub rejected: Vec<RejectedRecord>,
}

/// Project raw final-post records into dashboard rows.
pub fn build_dashboard(posts: &[Value]) -> DashboardReport {
    let mut report = DashboardReport::default();
    for (index, post) in posts.iter().enumerate() {
        match project(post) {
            Ok(row) => report.rows.push(row),
            Err(reason) => {
                warn!(index, %reason, "Rejected final post record");
                report.rejected.push(RejectedRecord { index, reason });
            }
        }
    }
    report
}

fn project(post: &Value) -> Result<DashboardRow, String> {
    let Some(fields) = post.as_object() else {
        return Err("record is not an object".to_string());
    };
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("missing or non-text `{}`", key))
    };
    let engagement = fields.get("engagement");
    let counter = |key: &str| {
        engagement
            .and_then(|e| e.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };

    Ok(DashboardRow {
        source: text("source")?,
        title: text("title")?,
        likes: counter("likes"),
        shares: counter("shares"),
        comments: counter("comments"),
        scheduled_time: fields
            .get("scheduled_time")
            .and_then(Value::as_str)
            .map(str::to_string),
        image: text("image_asset")?,
        post: text("social_post")?,
    })
}

/// Read `final_posts`, build the dashboard and write it to `dashboard`.
///
/// An unreadable or malformed `final_posts` file is an error; individual bad
/// records are reported in the returned [`DashboardReport`].
#[instrument(level = "info", skip_all, fields(final_posts = %final_posts.display()))]
pub async fn generate_dashboard(
    final_posts: &Path,
    dashboard: &Path,
) -> Result<DashboardReport, PersistError> {
    let posts: Vec<Value> = read_snapshot(final_posts).await?;
    let report = build_dashboard(&posts);
    write_snapshot(dashboard, &report.rows).await?;
    info!(
        rows = report.rows.len(),
        rejected = report.rejected.len(),
        path = %dashboard.display(),
        "Dashboard created"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> Value {
        json!({
            "source": "Bloomberg",
            "title": "Yen slides",
            "subhead": "",
            "url": "https://www.bloomberg.com/news/articles/yen",
            "social_post": "Yen at a 30-year low. Read more ➜",
            "image_asset": "images/Yen_slides.png",
            "scheduled_time": "2025-05-06 17:30",
            "engagement": {"likes": 120, "shares": 30, "comments": 9}
        })
    }

    #[test]
    fn test_projects_and_flattens() {
        let report = build_dashboard(&[post()]);
        assert!(report.rejected.is_empty());
        assert_eq!(
            report.rows,
            vec![DashboardRow {
                source: "Bloomberg".to_string(),
                title: "Yen slides".to_string(),
                likes: 120,
                shares: 30,
                comments: 9,
                scheduled_time: Some("2025-05-06 17:30".to_string()),
                image: "images/Yen_slides.png".to_string(),
                post: "Yen at a 30-year low. Read more ➜".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_counters_and_slot_default() {
        let mut p = post();
        let obj = p.as_object_mut().unwrap();
        obj.remove("scheduled_time");
        obj.insert("engagement".to_string(), json!({"likes": 4}));

        let report = build_dashboard(&[p]);
        let row = &report.rows[0];
        assert_eq!((row.likes, row.shares, row.comments), (4, 0, 0));
        assert_eq!(row.scheduled_time, None);
    }

    #[test]
    fn test_malformed_records_are_reported() {
        let mut no_title = post();
        no_title.as_object_mut().unwrap().remove("title");

        let report = build_dashboard(&[no_title, json!("not a post"), post()]);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].index, 0);
        assert!(report.rejected[0].reason.contains("title"));
        assert_eq!(report.rejected[1].index, 1);
    }

    #[tokio::test]
    async fn test_generate_dashboard_writes_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let final_posts = tmp.path().join("final_posts.json");
        let dashboard = tmp.path().join("dashboard.json");
        std::fs::write(&final_posts, serde_json::to_string(&vec![post()]).unwrap()).unwrap();

        let report = generate_dashboard(&final_posts, &dashboard).await.unwrap();
        assert_eq!(report.rows.len(), 1);

        let written: Vec<DashboardRow> =
            serde_json::from_str(&std::fs::read_to_string(&dashboard).unwrap()).unwrap();
        assert_eq!(written, report.rows);
    }

    #[tokio::test]
    async fn test_generate_dashboard_fails_on_corrupt_source() {
        let tmp = tempfile::tempdir().unwrap();
        let final_posts = tmp.path().join("final_posts.json");
        let dashboard = tmp.path().join("dashboard.json");
        std::fs::write(&final_posts, "{not json").unwrap();

        assert!(generate_dashboard(&final_posts, &dashboard).await.is_err());
        assert!(!dashboard.exists());
    }
}
