//! SaaS business-plan generation from a post.
//!
//! A fixed prompt is sent to the configured provider and the loosely structured
//! reply is validated into a [`BusinessPlan`]. Validation is all-or-nothing.

mod document;
mod parse;
mod prompt;
mod provider;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::feed::Post;

pub use document::{document_filename, render_markdown};
pub use parse::{parse_plan_reply, REQUIRED_FIELDS};
pub use prompt::{build_prompt, SYSTEM_PREAMBLE};
pub use provider::{AiProvider, GeminiClient, API_KEY_HEADER, MAX_OUTPUT_TOKENS, TEMPERATURE};

#[derive(Debug, Error)]
pub enum PlanError {
    /// The requested provider is not wired up.
    #[error("unsupported AI provider '{0}', only 'google' is supported")]
    UnsupportedProvider(String),
    /// The provider answered with a non-success status or an unusable envelope.
    #[error("AI provider error ({status}): {body}")]
    Upstream { status: u16, body: String },
    /// Transport failure. The wrapped error never carries the request URL.
    #[error("AI provider request failed: {0}")]
    Request(#[source] reqwest::Error),
    /// The reply could not be turned into a valid plan.
    #[error("failed to parse AI response as a business plan: {reason}")]
    Parse { reason: String, raw: String },
}

/// A generated business plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPlan {
    #[serde(default, deserialize_with = "lenient_text")]
    pub saas_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tagline: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub problem_statement: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub solution: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub target_market: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub business_model: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_features: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub marketing_strategy: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub competitive_advantage: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub revenue_model: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub implementation: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub risks: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub next_steps: Vec<String>,
}

/// Text fields accept any JSON shape; models often nest sections as objects.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

/// List fields accept an array, a single string, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => vec![value_to_text(&other)],
    };
    Ok(items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| format!("{key}: {}", value_to_text(value)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Builds prompts, calls the provider and validates its reply.
pub struct PlanGenerator {
    gemini: GeminiClient,
}

impl PlanGenerator {
    #[must_use]
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Generate a plan for `post` using the named provider.
    ///
    /// The provider name is checked before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnsupportedProvider`] for unknown providers,
    /// [`PlanError::Upstream`]/[`PlanError::Request`] when the provider call
    /// fails, and [`PlanError::Parse`] when the reply is not a valid plan.
    pub async fn generate(
        &self,
        post: &Post,
        provider: &str,
        api_key: &str,
    ) -> Result<BusinessPlan, PlanError> {
        let provider: AiProvider = provider.parse()?;
        let prompt = build_prompt(post);

        info!(provider = %provider, title = %post.title, "Generating business plan");

        let reply = match provider {
            AiProvider::Google => self.gemini.generate(&prompt, api_key).await?,
        };

        parse_plan_reply(&reply).inspect_err(|e| {
            error!(error = %e, raw = %reply, "AI reply failed validation");
        })
    }
}
