//! Error types for each stage of the pipeline.
//!
//! Every operation returns its own error kind so callers can tell a
//! recoverable failure (a source that could not be fetched, a post that could
//! not be generated) from a fatal one (the hand-off snapshot is unreadable).

use crate::models::Source;
use std::path::PathBuf;

/// Failure while retrieving or parsing a single news source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The feed body was not valid RSS.
    #[error("could not parse feed from {url}: {message}")]
    Feed { url: String, message: String },

    /// A CSS selector failed to compile.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// Anything else a fetcher wants to surface (used by test doubles too).
    #[error("{0}")]
    Other(String),
}

/// Failure while asking the text model for a social post.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion endpoint answered with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response contained no text")]
    EmptyReply,
}

/// Failure while drawing or saving a headline card.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("could not prepare image directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("could not save image {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure while reading or writing a JSON snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Stage-level failures; any of these stops the current stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The fetch stage could not commit `top_stories.json`.
    #[error("fetch stage could not commit top stories: {0}")]
    Commit(#[source] PersistError),

    /// The rewrite stage could not read the hand-off snapshot.
    #[error("rewrite stage could not load top stories: {0}")]
    Handoff(#[source] PersistError),

    /// The rewrite stage could not persist its output.
    #[error("could not write final posts: {0}")]
    FinalPosts(#[source] PersistError),

    /// The dashboard could not be built or written.
    #[error("dashboard generation failed: {0}")]
    Dashboard(#[source] PersistError),

    /// The images directory could not be reset.
    #[error("could not reset images directory: {0}")]
    Images(#[source] RenderError),
}

/// A per-source fetch failure, as reported by the orchestrator.
#[derive(Debug)]
pub struct FetchFailure {
    pub source: Source,
    pub error: FetchError,
}
