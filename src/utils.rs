//! Utility functions for publication slots, string handling, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Publication slot resolution for scheduling posts
//! - String truncation for logging and file name sanitization for image cards
//! - File system validation for the output directory

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Format used for `scheduled_time` values.
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Map a wall-clock instant to one of the three daily publication slots.
///
/// The slot boundaries are:
/// - before 10:00 → **08:30**
/// - 10:00 to 13:59 → **12:30**
/// - from 14:00 → **17:30**
///
/// # Returns
///
/// A string formatted as `"YYYY-MM-DD HH:MM"` on the same date as `now`.
pub fn schedule_slot(now: NaiveDateTime) -> String {
    let slot = match now.hour() {
        0..=9 => "08:30",
        10..=13 => "12:30",
        _ => "17:30",
    };
    format!("{} {}", now.format("%Y-%m-%d"), slot)
}

/// The publication slot for the current local time.
#[instrument]
pub fn current_schedule_slot() -> String {
    let now = Local::now();
    let slot = schedule_slot(now.naive_local());
    tracing::debug!(now = %now, %slot, "Computed schedule slot");
    slot
}

/// Current local time formatted like a `scheduled_time`.
pub fn now_stamp() -> String {
    stamp(Local::now())
}

fn stamp(at: DateTime<Local>) -> String {
    at.format(SLOT_FORMAT).to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

static FORBIDDEN_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("static regex"));

/// Turn a headline into an image file name.
///
/// Keeps the first 50 characters, drops characters that are not allowed in
/// file names on common platforms, and replaces spaces with underscores.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(headline_file_name("Fed: rates on hold?"), "Fed_rates_on_hold.png");
/// ```
pub fn headline_file_name(headline: &str) -> String {
    let head: String = headline.chars().take(50).collect();
    let safe = FORBIDDEN_FILENAME_CHARS.replace_all(&head, "");
    format!("{}.png", safe.replace(' ', "_"))
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
