//! Feedback record creation and sentiment classification.
//!
//! Creation is a fixed sequence: validate the draft, classify the text,
//! then persist the record with its final label. The classification call
//! blocks completion of the creation operation but can never fail it:
//! any provider error resolves to the neutral fallback, and the write
//! still completes. Nothing is persisted when validation or the write
//! itself fails.

use anyhow::Result;
use tracing::{info, warn};

use crate::ai::{create_provider, AiProvider};
use crate::config::Config;
use crate::db;
use crate::error::FeedbackError;
use crate::models::{format_ts_iso, FeedbackRecord, NewFeedback, Sentiment, Source};
use crate::sqlite_store::SqliteStore;
use crate::store::FeedbackStore;

/// Raw creation input as it arrives from callers.
#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub text: String,
    pub source: String,
    pub metadata: Option<serde_json::Value>,
}

/// Classify one text, absorbing any provider failure into the neutral
/// fallback. Single attempt, bounded by the provider timeout.
pub async fn classify_or_neutral(ai: &dyn AiProvider, text: &str) -> Sentiment {
    match ai.classify_sentiment(text).await {
        Ok(sentiment) => sentiment,
        Err(err) => {
            warn!(
                provider = ai.name(),
                "sentiment classification failed, falling back to neutral: {:#}", err
            );
            Sentiment::Neutral
        }
    }
}

/// Create a feedback record: validate, classify, persist.
pub async fn create_feedback(
    store: &dyn FeedbackStore,
    ai: &dyn AiProvider,
    input: CreateFeedback,
) -> Result<FeedbackRecord, FeedbackError> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(FeedbackError::validation(
            "text",
            "feedback text must not be empty",
        ));
    }

    let source_raw = input.source.trim();
    let source = Source::parse(source_raw).ok_or_else(|| {
        FeedbackError::validation(
            "source",
            format!(
                "unknown source '{}'; expected one of: {}",
                source_raw,
                Source::vocabulary()
            ),
        )
    })?;

    let sentiment = classify_or_neutral(ai, text).await;

    let record = store
        .insert(NewFeedback {
            text: text.to_string(),
            source,
            sentiment,
            metadata: input.metadata,
        })
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    info!(
        id = record.id,
        sentiment = record.sentiment.as_str(),
        "created feedback"
    );
    Ok(record)
}

/// Fetch a record by id.
pub async fn get_feedback(
    store: &dyn FeedbackStore,
    id: i64,
) -> Result<FeedbackRecord, FeedbackError> {
    store
        .get(id)
        .await
        .map_err(FeedbackError::StoreUnavailable)?
        .ok_or(FeedbackError::NotFound(id))
}

/// Re-run sentiment classification for an existing record and overwrite
/// its label. The creation-time fallback policy applies here too: a
/// provider failure records neutral rather than failing the operation.
pub async fn reclassify_feedback(
    store: &dyn FeedbackStore,
    ai: &dyn AiProvider,
    id: i64,
) -> Result<FeedbackRecord, FeedbackError> {
    let record = get_feedback(store, id).await?;
    let sentiment = classify_or_neutral(ai, &record.text).await;

    let updated = store
        .set_sentiment(id, sentiment)
        .await
        .map_err(FeedbackError::StoreUnavailable)?
        .ok_or(FeedbackError::NotFound(id))?;

    info!(
        id = updated.id,
        sentiment = updated.sentiment.as_str(),
        "reclassified feedback"
    );
    Ok(updated)
}

// ============ CLI entry points ============

pub async fn run_add(
    config: &Config,
    text: String,
    source: String,
    metadata: Option<String>,
) -> Result<()> {
    let metadata = match metadata {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            FeedbackError::validation("metadata", format!("metadata is not valid JSON: {}", e))
        })?),
        None => None,
    };

    let ai = create_provider(&config.ai)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let record = create_feedback(
        &store,
        ai.as_ref(),
        CreateFeedback {
            text,
            source,
            metadata,
        },
    )
    .await?;

    print_record(&record);
    store.pool().close().await;
    Ok(())
}

pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let result = get_feedback(&store, id).await;
    store.pool().close().await;

    print_record(&result?);
    Ok(())
}

pub async fn run_reclassify(config: &Config, id: i64) -> Result<()> {
    let ai = create_provider(&config.ai)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let result = reclassify_feedback(&store, ai.as_ref(), id).await;
    store.pool().close().await;

    print_record(&result?);
    Ok(())
}

fn print_record(record: &FeedbackRecord) {
    println!("--- Feedback ---");
    println!("id:         {}", record.id);
    println!("source:     {}", record.source);
    println!("sentiment:  {}", record.sentiment);
    println!("created_at: {}", format_ts_iso(record.created_at));
    if let Some(ref metadata) = record.metadata {
        println!("metadata:   {}", metadata);
    }
    println!();
    println!("{}", record.text);
}
