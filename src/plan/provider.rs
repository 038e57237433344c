use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompt::SYSTEM_PREAMBLE;
use super::PlanError;

/// Sampling temperature sent with every generation request.
pub const TEMPERATURE: f32 = 0.7;

/// Output-length ceiling sent with every generation request.
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

/// Header carrying the caller's Gemini credential.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// AI providers that can generate plans.
///
/// Adding a provider means adding a variant and its request/response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Google,
}

impl AiProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::Google => "google",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(AiProvider::Google),
            _ => Err(PlanError::UnsupportedProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    /// Send one prompt and return the model's raw text reply.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Upstream`] on a non-success status (with the
    /// provider's error text) or when the reply carries no text, and
    /// [`PlanError::Request`] on transport failures.
    pub async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, PlanError> {
        let text = format!("{SYSTEM_PREAMBLE}\n\n{prompt}");
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &text }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!(model = %self.model, prompt_len = text.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlanError::Upstream {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let reply: GenerateContentResponse = response.json().await.map_err(redact)?;
        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| PlanError::Upstream {
                status: status.as_u16(),
                body: "response contained no candidate text".to_string(),
            })
    }
}

/// Transport errors carry the request URL; keep it out of messages and logs.
fn redact(error: reqwest::Error) -> PlanError {
    PlanError::Request(error.without_url())
}
