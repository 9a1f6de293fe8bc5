//! AI provider abstraction and implementations.
//!
//! Defines the [`AiProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when no provider is
//!   configured. Record creation still works (classification falls back to
//!   neutral upstream); summarization surfaces an unavailable error.
//! - **[`GeminiProvider`]** — calls the Google Gemini `generateContent` API.
//!
//! Both provider calls are request/response, single-shot, and bounded by
//! the configured timeout. There is no retry loop: classification runs
//! inline with record creation and summarization inline with the caller's
//! request, so each call either resolves within the request budget or
//! fails with the defined fallback/error behavior.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::config::AiConfig;
use crate::models::Sentiment;

/// Trait for AI providers.
///
/// Collaborators are passed explicitly into the classifier and the
/// summarization engine, so tests can substitute deterministic fakes.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider identifier for logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Classify one feedback text into a sentiment label.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts, non-success responses, and
    /// out-of-vocabulary labels are all errors; the caller decides the
    /// fallback policy.
    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment>;

    /// Generate a free-form narrative for an already-built prompt.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts, non-success responses, and empty
    /// responses are errors. No partial output is returned.
    async fn generate_summary(&self, prompt: &str) -> Result<String>;
}

// ============ Disabled Provider ============

/// A no-op provider that always returns errors.
///
/// Used when `ai.provider = "disabled"` in the configuration.
pub struct DisabledProvider;

#[async_trait]
impl AiProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn classify_sentiment(&self, _text: &str) -> Result<Sentiment> {
        bail!("AI provider is disabled")
    }

    async fn generate_summary(&self, _prompt: &str) -> Result<String> {
        bail!("AI provider is disabled")
    }
}

// ============ Gemini Provider ============

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Classification prompts only see a bounded slice of the feedback text.
const CLASSIFY_SNIPPET_CHARS: usize = 1000;

/// Provider calling the Google Gemini `generateContent` endpoint.
///
/// Requires the `GEMINI_API_KEY` environment variable; the key is read at
/// call time so a misconfigured environment degrades per-call (creation
/// falls back to neutral) instead of preventing startup.
pub struct GeminiProvider {
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("ai.model required for Gemini provider"))?;

        Ok(Self {
            model,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Single-shot `generateContent` call returning the candidate text.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_gemini_response(&json)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment> {
        let snippet: String = text.chars().take(CLASSIFY_SNIPPET_CHARS).collect();
        let prompt = format!(
            "Analyze the sentiment of the following customer feedback.\n\
             Respond with ONLY one word: positive, negative, or neutral.\n\
             \n\
             Feedback: {}\n\
             \n\
             Sentiment:",
            snippet
        );

        let reply = self.generate(&prompt).await?;
        extract_sentiment_label(&reply)
            .ok_or_else(|| anyhow!("unexpected sentiment label from model: '{}'", reply.trim()))
    }

    async fn generate_summary(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }
}

/// Parse the `generateContent` response JSON, extracting the first
/// candidate's text. An empty narrative counts as a malformed response.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing candidate text"))?;

    let text = text.trim();
    if text.is_empty() {
        bail!("Empty response from Gemini");
    }
    Ok(text.to_string())
}

/// Pull a sentiment label out of a model reply: first word, lowered,
/// stripped of punctuation. Anything outside the vocabulary is `None`.
fn extract_sentiment_label(reply: &str) -> Option<Sentiment> {
    let word = reply
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .to_lowercase();
    Sentiment::parse(&word)
}

/// Create the appropriate [`AiProvider`] based on configuration.
pub fn create_provider(config: &AiConfig) -> Result<Box<dyn AiProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => bail!("Unknown AI provider: {}", other),
    }
}
