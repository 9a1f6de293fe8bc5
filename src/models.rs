//! Core data models for Feedback Lens.
//!
//! These types represent the feedback records that flow through the
//! retrieval, aggregation, and summarization pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a piece of feedback came from. Fixed vocabulary, validated at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    SupportTicket,
    Survey,
    AppStore,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::SupportTicket, Source::Survey, Source::AppStore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::SupportTicket => "support_ticket",
            Source::Survey => "survey",
            Source::AppStore => "app_store",
        }
    }

    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "support_ticket" => Some(Source::SupportTicket),
            "survey" => Some(Source::Survey),
            "app_store" => Some(Source::AppStore),
            _ => None,
        }
    }

    /// Comma-separated vocabulary listing for validation messages.
    pub fn vocabulary() -> String {
        Source::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment label attached to every stored record. Set once by the
/// classifier at creation, overwritten only by explicit re-classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Sentiment> {
        match s {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    pub fn vocabulary() -> String {
        Sentiment::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored feedback record.
///
/// `id` and `created_at` are assigned by the store at insert and never
/// change. `sentiment` is always present: a record only becomes visible
/// once classification (or its fallback) has produced a label.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub id: i64,
    pub text: String,
    pub source: Source,
    pub sentiment: Sentiment,
    /// Unix seconds, UTC.
    pub created_at: i64,
    /// Open key-value bag, opaque to the pipeline.
    pub metadata: Option<serde_json::Value>,
}

/// A validated, classified record ready for insertion. The store assigns
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub text: String,
    pub source: Source,
    pub sentiment: Sentiment,
    pub metadata: Option<serde_json::Value>,
}

/// Format a Unix timestamp for API and CLI output.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
