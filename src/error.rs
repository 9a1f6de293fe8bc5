//! Error taxonomy for the feedback pipeline.
//!
//! Validation and not-found are expected, caller-recoverable conditions and
//! carry enough detail to be surfaced verbatim. Provider and store failures
//! are distinct kinds so the presentation layer can tell "nothing to show"
//! apart from "something is broken". Sentiment-classification failure is
//! deliberately absent: it is absorbed at the call site with the neutral
//! fallback and never reaches a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Malformed or contradictory input, naming the offending field.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Id lookup miss.
    #[error("feedback {0} not found")]
    NotFound(i64),

    /// Summarization requested over zero matching records.
    #[error("no feedback matched the request; nothing to summarize")]
    EmptyBatch,

    /// The AI provider failed or timed out while generating a summary.
    /// No partial summary is ever returned in this case.
    #[error("summary generation unavailable")]
    SummarizationUnavailable(#[source] anyhow::Error),

    /// The record store failed on any operation. Fatal to the current
    /// request.
    #[error("feedback store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl FeedbackError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
