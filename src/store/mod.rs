//! Storage abstraction for feedback records.
//!
//! The [`FeedbackStore`] trait defines every operation the retrieval,
//! aggregation, and summarization pipeline needs from the record store,
//! enabling pluggable backends (SQLite in production, in-memory in tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes, and
//! must honor one shared ordering contract: `created_at` descending, ties
//! broken by `id` descending. That guarantees stable pagination across
//! calls even when two records share a timestamp.

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::filter::FeedbackFilter;
use crate::models::{FeedbackRecord, NewFeedback, Sentiment};

/// Which column [`FeedbackStore::aggregate_counts`] groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountField {
    Source,
    Sentiment,
}

/// Abstract record store for feedback.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](FeedbackStore::insert) | Persist a classified record, assigning id + timestamp |
/// | [`query`](FeedbackStore::query) | Filtered window of records plus the full matching count |
/// | [`query_by_ids`](FeedbackStore::query_by_ids) | Exact-id fetch, unknown ids silently dropped |
/// | [`get`](FeedbackStore::get) | Single record by id |
/// | [`set_sentiment`](FeedbackStore::set_sentiment) | Overwrite a record's label (re-classification) |
/// | [`aggregate_counts`](FeedbackStore::aggregate_counts) | Corpus-wide label counts, zero labels omitted |
/// | [`count_all`](FeedbackStore::count_all) | Total record count |
/// | [`count_since`](FeedbackStore::count_since) | Records created at or after a timestamp |
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persist a new record. The store assigns the id (monotonic) and the
    /// creation timestamp; both are immutable afterwards.
    async fn insert(&self, draft: NewFeedback) -> Result<FeedbackRecord>;

    /// Fetch a window of records matching `filter`, newest first, together
    /// with the total count of matching records. The count is computed
    /// with the same predicate set as the window.
    async fn query(
        &self,
        filter: &FeedbackFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FeedbackRecord>, i64)>;

    /// Fetch records by exact id, newest first. Ids with no backing record
    /// are dropped, not an error.
    async fn query_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedbackRecord>>;

    /// Fetch a single record by id.
    async fn get(&self, id: i64) -> Result<Option<FeedbackRecord>>;

    /// Overwrite the sentiment of an existing record. Returns the updated
    /// record, or `None` when the id does not exist.
    async fn set_sentiment(&self, id: i64, sentiment: Sentiment) -> Result<Option<FeedbackRecord>>;

    /// Count records grouped by the given field over the whole corpus.
    /// Labels with zero occurrences are omitted.
    async fn aggregate_counts(&self, field: CountField) -> Result<HashMap<String, i64>>;

    /// Total number of records in the store.
    async fn count_all(&self) -> Result<i64>;

    /// Number of records with `created_at >= ts`.
    async fn count_since(&self, ts: i64) -> Result<i64>;
}
