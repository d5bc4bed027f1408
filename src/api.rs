//! Text generation for social posts through an OpenAI-compatible API.
//!
//! # Architecture
//!
//! - [`CopyWriter`]: Core trait defining async completion of a prompt
//! - [`OpenAiCopyWriter`]: Calls `/chat/completions` on an OpenAI-compatible endpoint
//! - [`generate_social_post`]: Builds the prompt for a story and degrades any
//!   failure to [`GENERATION_FAILED`]
//!
//! Completions are not retried; a failed story keeps the sentinel text and the
//! batch carries on.

use crate::error::GenerationError;
use crate::models::Story;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Text stored in `social_post` when generation fails.
pub const GENERATION_FAILED: &str = "GPT failed";

const SYSTEM_PROMPT: &str = "You are a professional social media copywriter.";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

/// Trait for async text completion.
///
/// Implementors send a prompt to a language model and return its reply.
pub trait CopyWriter {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// [`CopyWriter`] backed by an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCopyWriter {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCopyWriter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        })
    }
}

impl CopyWriter for OpenAiCopyWriter {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        let t0 = Instant::now();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Completion succeeded");
        Ok(text)
    }
}

/// Build the copywriting prompt for a story.
pub fn social_post_prompt(story: &Story) -> String {
    [
        "You are a social media assistant for a financial news brand.".to_string(),
        "Your job is to turn a news story into a short social media post with:".to_string(),
        "- A punchy hook".to_string(),
        "- A brief summary (if needed)".to_string(),
        "- A clear call-to-action".to_string(),
        "Keep it under 200 characters. Brand tone is confident, clever, and professional."
            .to_string(),
        String::new(),
        format!("Title: {}", story.title),
        format!("Subhead: {}", story.subhead.as_deref().unwrap_or_default()),
        format!("Source: {}", story.source),
        format!("URL: {}", story.url),
    ]
    .join("\n")
}

/// Generate the social post for a story, or [`GENERATION_FAILED`] on any error.
#[instrument(level = "info", skip_all, fields(source = %story.source))]
pub async fn generate_social_post<W: CopyWriter>(writer: &W, story: &Story) -> String {
    match writer.complete(&social_post_prompt(story)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(title = %story.title, error = %e, "Social post generation failed");
            GENERATION_FAILED.to_string()
        }
    }
}
