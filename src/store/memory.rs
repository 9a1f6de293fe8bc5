//! In-memory [`FeedbackStore`] implementation for tests.
//!
//! Uses a `Vec` behind `std::sync::RwLock` for thread safety. Predicate
//! evaluation delegates to [`FeedbackFilter::matches`], so this store and
//! the SQLite store share one reference semantics.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::filter::FeedbackFilter;
use crate::models::{FeedbackRecord, NewFeedback, Sentiment, Source};

use super::{CountField, FeedbackStore};

struct Inner {
    rows: Vec<FeedbackRecord>,
    next_id: i64,
}

/// In-memory store backing unit tests.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed a record with an explicit creation timestamp. Tests use this to
    /// pin ordering and date-window scenarios; production inserts go
    /// through [`FeedbackStore::insert`].
    pub fn seed(
        &self,
        text: &str,
        source: Source,
        sentiment: Sentiment,
        created_at: i64,
    ) -> i64 {
        let mut inner = self.inner.write().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.push(FeedbackRecord {
            id,
            text: text.to_string(),
            source,
            sentiment,
            created_at,
            metadata: None,
        });
        id
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_newest_first(rows: &mut [FeedbackRecord]) {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn insert(&self, draft: NewFeedback) -> Result<FeedbackRecord> {
        let now = chrono::Utc::now().timestamp();
        let mut inner = self.inner.write().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        let record = FeedbackRecord {
            id,
            text: draft.text,
            source: draft.source,
            sentiment: draft.sentiment,
            created_at: now,
            metadata: draft.metadata,
        };
        inner.rows.push(record.clone());
        Ok(record)
    }

    async fn query(
        &self,
        filter: &FeedbackFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FeedbackRecord>, i64)> {
        let inner = self.inner.read().unwrap();
        let mut matching: Vec<FeedbackRecord> = inner
            .rows
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        let total = matching.len() as i64;
        let items: Vec<FeedbackRecord> = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    async fn query_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedbackRecord>> {
        let inner = self.inner.read().unwrap();
        let mut matching: Vec<FeedbackRecord> = inner
            .rows
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn get(&self, id: i64) -> Result<Option<FeedbackRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn set_sentiment(&self, id: i64, sentiment: Sentiment) -> Result<Option<FeedbackRecord>> {
        let mut inner = self.inner.write().unwrap();
        match inner.rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.sentiment = sentiment;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn aggregate_counts(&self, field: CountField) -> Result<HashMap<String, i64>> {
        let inner = self.inner.read().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in &inner.rows {
            let label = match field {
                CountField::Source => row.source.as_str(),
                CountField::Sentiment => row.sentiment.as_str(),
            };
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_all(&self) -> Result<i64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.rows.len() as i64)
    }

    async fn count_since(&self, ts: i64) -> Result<i64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.rows.iter().filter(|r| r.created_at >= ts).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = InMemoryStore::new();
        let a = store
            .insert(NewFeedback {
                text: "first".to_string(),
                source: Source::Survey,
                sentiment: Sentiment::Neutral,
                metadata: None,
            })
            .await
            .unwrap();
        let b = store
            .insert(NewFeedback {
                text: "second".to_string(),
                source: Source::Survey,
                sentiment: Sentiment::Neutral,
                metadata: None,
            })
            .await
            .unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_with_id_tiebreak() {
        let store = InMemoryStore::new();
        let a = store.seed("old", Source::Survey, Sentiment::Neutral, 100);
        let b = store.seed("tied-low", Source::Survey, Sentiment::Neutral, 200);
        let c = store.seed("tied-high", Source::Survey, Sentiment::Neutral, 200);

        let (items, total) = store
            .query(&FeedbackFilter::default(), 0, 10)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let ids: Vec<i64> = items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_query_by_ids_drops_unknown() {
        let store = InMemoryStore::new();
        let a = store.seed("one", Source::Survey, Sentiment::Neutral, 100);
        let records = store.query_by_ids(&[a, 999]).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, a);
    }

    #[tokio::test]
    async fn test_set_sentiment_missing_id() {
        let store = InMemoryStore::new();
        let updated = store.set_sentiment(42, Sentiment::Positive).await.unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_aggregate_counts_omits_zero_labels() {
        let store = InMemoryStore::new();
        store.seed("a", Source::Survey, Sentiment::Positive, 100);
        store.seed("b", Source::Survey, Sentiment::Positive, 100);

        let counts = store.aggregate_counts(CountField::Sentiment).await.unwrap();
        assert_eq!(counts.get("positive"), Some(&2));
        assert!(!counts.contains_key("negative"));
        assert!(!counts.contains_key("neutral"));
    }
}
