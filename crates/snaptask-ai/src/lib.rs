mod parse;
mod prompt;

use std::path::Path;

use base64::Engine;
use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use snaptask_core::{screenshot, TaskSuggestion};

pub use parse::parse_suggestion;
pub use prompt::extraction_prompt;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Model client configuration, constructed by the caller and injected into
/// [`SuggestClient`]. There is no global key.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Build from `SNAPTASK_AI_*` environment variables, falling back to
    /// `GEMINI_API_KEY` for the key. `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("SNAPTASK_AI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("SNAPTASK_AI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("SNAPTASK_AI_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }
}

/// Client for the `generateContent` endpoint that turns one screenshot into
/// a [`TaskSuggestion`].
pub struct SuggestClient {
    config: AiConfig,
    client: reqwest::Client,
}

impl SuggestClient {
    pub fn new(config: AiConfig) -> Result<Self, SuggestError> {
        let client = reqwest::Client::builder()
            .user_agent("snaptask")
            .build()
            .map_err(|e| SuggestError::Generation(format!("HTTP client init: {e}")))?;
        Ok(Self { config, client })
    }

    /// Extract a candidate task from the image at `path`.
    ///
    /// An all-empty suggestion means the model found nothing; every failure
    /// class is an `Err` so callers can log them apart.
    pub async fn suggest(&self, path: &Path) -> Result<TaskSuggestion, SuggestError> {
        // Validate decodability before spending a network call, and reject
        // paths that are not images at all.
        let decode_path = path.to_path_buf();
        tokio::task::spawn_blocking(move || image::open(&decode_path))
            .await
            .map_err(|e| SuggestError::Generation(e.to_string()))?
            .map_err(|e| {
                SuggestError::UnreadableImage(format!("{}: {e}", path.display()))
            })?;

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| SuggestError::UnreadableImage(format!("{}: {e}", path.display())))?;
        let mime = screenshot::mime_type(path).unwrap_or("image/png");
        let prompt = prompt::extraction_prompt(Local::now());

        debug!(path = %path.display(), model = %self.config.model, "requesting task extraction");
        let text = self.generate(mime, &data, &prompt).await?;
        debug!(reply_len = text.len(), "model reply received");
        parse::parse_suggestion(&text)
    }

    async fn generate(
        &self,
        mime: &str,
        data: &[u8],
        prompt: &str,
    ) -> Result<String, SuggestError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(data),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SuggestError::Generation(format!("HTTP request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SuggestError::Generation(format!(
                "model API returned {status}: {body}"
            )));
        }

        let reply: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| SuggestError::Generation(format!("invalid response body: {e}")))?;
        reply
            .text()
            .ok_or_else(|| SuggestError::Generation("empty model response".into()))
    }
}

// -- Wire format --

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ReplyContent>,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
