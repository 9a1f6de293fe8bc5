//! Summarization engine: bounded batch → prompt → AI provider → result.
//!
//! The batch fed to the provider is capped (`summary.max_batch_size`,
//! default 50), which bounds prompt size, cost, and latency of the
//! external call no matter how broad the filter is. Callers needing a
//! wider summary narrow their filter instead.
//!
//! The sentiment breakdown is tallied over the batch actually sent, not
//! the full filtered population, so `feedback_count` and the breakdown's
//! sum always describe what the model saw.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::ai::{create_provider, AiProvider};
use crate::config::Config;
use crate::db;
use crate::error::FeedbackError;
use crate::filter::{FeedbackFilter, FilterParams};
use crate::models::FeedbackRecord;
use crate::query::{fetch_bounded, BatchSelection};
use crate::sqlite_store::SqliteStore;
use crate::store::FeedbackStore;

/// What to summarize: an explicit id list, or a filter. A non-empty id
/// list takes precedence and the filter is ignored entirely.
#[derive(Debug, Clone, Default)]
pub struct SummarizeRequest {
    pub feedback_ids: Option<Vec<i64>>,
    pub filter: FeedbackFilter,
}

/// A generated summary over a specific batch of records.
#[derive(Debug, Serialize)]
pub struct SummaryResult {
    pub summary: String,
    pub feedback_count: usize,
    pub sentiment_breakdown: HashMap<String, i64>,
}

/// Produce a structured summary of the matching feedback.
///
/// Fails with [`FeedbackError::EmptyBatch`] when nothing matches (before
/// any provider call) and with [`FeedbackError::SummarizationUnavailable`]
/// when the provider fails; no partial summary is ever returned.
pub async fn summarize(
    store: &dyn FeedbackStore,
    ai: &dyn AiProvider,
    max_batch_size: i64,
    request: &SummarizeRequest,
) -> Result<SummaryResult, FeedbackError> {
    let selection = match request.feedback_ids.as_deref() {
        Some(ids) if !ids.is_empty() => BatchSelection::Ids(ids),
        _ => BatchSelection::Filter(&request.filter),
    };

    let batch = fetch_bounded(store, selection, max_batch_size).await?;
    if batch.is_empty() {
        return Err(FeedbackError::EmptyBatch);
    }

    let prompt = build_prompt(&batch);
    let summary = ai
        .generate_summary(&prompt)
        .await
        .map_err(FeedbackError::SummarizationUnavailable)?;

    info!(count = batch.len(), "generated feedback summary");

    Ok(SummaryResult {
        summary,
        feedback_count: batch.len(),
        sentiment_breakdown: sentiment_breakdown(&batch),
    })
}

/// Build one prompt over the whole batch, in fetch order. Each entry is
/// tagged with its source and sentiment so the model can reference the
/// batch composition.
fn build_prompt(batch: &[FeedbackRecord]) -> String {
    let entries = batch
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "Feedback {} [source: {}, sentiment: {}]:\n{}",
                i + 1,
                record.source,
                record.sentiment,
                record.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "You are analyzing customer feedback for a product team.\n\
         Summarize the key themes, complaints, and positive feedback from the \
         following customer feedback entries.\n\
         Be concise but comprehensive. Focus on actionable insights.\n\
         \n\
         Feedback entries:\n\
         \n\
         {}\n\
         \n\
         Summary:",
        entries
    )
}

/// Tally sentiment labels over the batch. The counts sum to the batch
/// length by construction.
fn sentiment_breakdown(batch: &[FeedbackRecord]) -> HashMap<String, i64> {
    let mut breakdown: HashMap<String, i64> = HashMap::new();
    for record in batch {
        *breakdown
            .entry(record.sentiment.as_str().to_string())
            .or_insert(0) += 1;
    }
    breakdown
}

/// CLI entry point: summarize by filter flags or an explicit id list.
pub async fn run_summarize(
    config: &Config,
    params: &FilterParams,
    ids: Vec<i64>,
) -> Result<()> {
    let filter = FeedbackFilter::from_params(params)?;
    let request = SummarizeRequest {
        feedback_ids: if ids.is_empty() { None } else { Some(ids) },
        filter,
    };

    let ai = create_provider(&config.ai)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let result = summarize(
        &store,
        ai.as_ref(),
        config.summary.max_batch_size,
        &request,
    )
    .await;
    store.pool().close().await;
    let result = result?;

    println!("--- Summary ({} feedback items) ---", result.feedback_count);
    println!();
    println!("{}", result.summary);
    println!();

    let mut entries: Vec<(&str, i64)> = result
        .sentiment_breakdown
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    println!("Sentiment breakdown:");
    for (label, count) in entries {
        println!("  {:<10} {}", label, count);
    }

    Ok(())
}
