//! Corpus statistics and overview.
//!
//! Aggregates counts over the entire record store, independent of any
//! active filter: the numbers back the filter-option UI, which needs the
//! global distribution of sources and sentiments. `recent_count` is
//! relative to the time of the call, so the result is time-dependent and
//! not cacheable across the window boundary.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::db;
use crate::error::FeedbackError;
use crate::sqlite_store::SqliteStore;
use crate::store::{CountField, FeedbackStore};

const SECS_PER_DAY: i64 = 86_400;

/// Aggregate statistics over the whole corpus. Labels with zero
/// occurrences are omitted from the count maps.
#[derive(Debug, Serialize)]
pub struct StatsOverview {
    pub total_feedback: i64,
    pub sentiment_counts: HashMap<String, i64>,
    pub source_counts: HashMap<String, i64>,
    pub recent_count: i64,
}

/// Compute corpus-wide statistics. `recent_count` covers the trailing
/// `recent_window_days` relative to now.
pub async fn compute_stats(
    store: &dyn FeedbackStore,
    recent_window_days: i64,
) -> Result<StatsOverview, FeedbackError> {
    let total_feedback = store
        .count_all()
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    let sentiment_counts = store
        .aggregate_counts(CountField::Sentiment)
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    let source_counts = store
        .aggregate_counts(CountField::Source)
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    let window_start = chrono::Utc::now().timestamp() - recent_window_days * SECS_PER_DAY;
    let recent_count = store
        .count_since(window_start)
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    Ok(StatsOverview {
        total_feedback,
        sentiment_counts,
        source_counts,
        recent_count,
    })
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let stats = compute_stats(&store, config.stats.recent_window_days).await?;

    println!("Feedback Lens — Corpus Stats");
    println!("============================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!();
    println!("  Feedback:  {}", stats.total_feedback);
    println!(
        "  Recent:    {} (last {} days)",
        stats.recent_count, config.stats.recent_window_days
    );

    print_counts("By sentiment", &stats.sentiment_counts);
    print_counts("By source", &stats.source_counts);
    println!();

    store.pool().close().await;
    Ok(())
}

/// Print a count map as an aligned table, largest counts first.
fn print_counts(heading: &str, counts: &HashMap<String, i64>) {
    if counts.is_empty() {
        return;
    }

    let mut entries: Vec<(&str, i64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    println!();
    println!("  {}:", heading);
    for (label, count) in entries {
        println!("  {:<16} {:>6}", label, count);
    }
}
