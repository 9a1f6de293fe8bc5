//! SQLite-backed [`FeedbackStore`] implementation.
//!
//! Compiles [`FeedbackFilter`] predicates into WHERE clauses and maps each
//! store operation onto one or two SQL statements. The page window and its
//! total count share one predicate assembly, so they can never disagree on
//! what "matching" means.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::filter::FeedbackFilter;
use crate::models::{FeedbackRecord, NewFeedback, Sentiment, Source};
use crate::store::{CountField, FeedbackStore};

const RECORD_COLUMNS: &str = "id, text, source, sentiment, created_at, metadata_json";
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// SQLite implementation of the [`FeedbackStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A positional bind argument for a dynamically assembled statement.
enum Arg {
    Text(String),
    Int(i64),
}

/// Compile filter predicates into a WHERE fragment plus its bind arguments,
/// in clause order. Substring search uses `instr` on lowered text, matching
/// [`FeedbackFilter::matches`] without LIKE wildcard surprises.
fn filter_sql(filter: &FeedbackFilter) -> (String, Vec<Arg>) {
    let mut clauses: Vec<&'static str> = Vec::new();
    let mut args: Vec<Arg> = Vec::new();

    if let Some(search) = filter.search() {
        clauses.push("instr(lower(text), ?) > 0");
        args.push(Arg::Text(search.to_lowercase()));
    }
    if let Some(source) = filter.source() {
        clauses.push("source = ?");
        args.push(Arg::Text(source.as_str().to_string()));
    }
    if let Some(sentiment) = filter.sentiment() {
        clauses.push("sentiment = ?");
        args.push(Arg::Text(sentiment.as_str().to_string()));
    }
    if let Some(ts) = filter.start_ts() {
        clauses.push("created_at >= ?");
        args.push(Arg::Int(ts));
    }
    if let Some(ts) = filter.end_ts() {
        clauses.push("created_at <= ?");
        args.push(Arg::Int(ts));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, args)
}

fn row_to_record(row: &SqliteRow) -> Result<FeedbackRecord> {
    let id: i64 = row.get("id");

    let source_raw: String = row.get("source");
    let source = Source::parse(&source_raw)
        .ok_or_else(|| anyhow!("feedback {}: unknown source '{}'", id, source_raw))?;

    let sentiment_raw: String = row.get("sentiment");
    let sentiment = Sentiment::parse(&sentiment_raw)
        .ok_or_else(|| anyhow!("feedback {}: unknown sentiment '{}'", id, sentiment_raw))?;

    let metadata_json: Option<String> = row.get("metadata_json");
    let metadata = metadata_json.and_then(|s| serde_json::from_str(&s).ok());

    Ok(FeedbackRecord {
        id,
        text: row.get("text"),
        source,
        sentiment,
        created_at: row.get("created_at"),
        metadata,
    })
}

#[async_trait]
impl FeedbackStore for SqliteStore {
    async fn insert(&self, draft: NewFeedback) -> Result<FeedbackRecord> {
        let now = chrono::Utc::now().timestamp();
        let metadata_json = draft
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            "INSERT INTO feedback (text, source, sentiment, created_at, metadata_json) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&draft.text)
        .bind(draft.source.as_str())
        .bind(draft.sentiment.as_str())
        .bind(now)
        .bind(&metadata_json)
        .execute(&self.pool)
        .await?;

        Ok(FeedbackRecord {
            id: result.last_insert_rowid(),
            text: draft.text,
            source: draft.source,
            sentiment: draft.sentiment,
            created_at: now,
            metadata: draft.metadata,
        })
    }

    async fn query(
        &self,
        filter: &FeedbackFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FeedbackRecord>, i64)> {
        let (where_sql, args) = filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM feedback{}", where_sql);
        let mut count_query = sqlx::query_scalar(&count_sql);
        for arg in &args {
            count_query = match arg {
                Arg::Text(s) => count_query.bind(s.clone()),
                Arg::Int(i) => count_query.bind(*i),
            };
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT {} FROM feedback{} {} LIMIT ? OFFSET ?",
            RECORD_COLUMNS, where_sql, NEWEST_FIRST
        );
        let mut select_query = sqlx::query(&select_sql);
        for arg in &args {
            select_query = match arg {
                Arg::Text(s) => select_query.bind(s.clone()),
                Arg::Int(i) => select_query.bind(*i),
            };
        }
        let rows = select_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(row_to_record).collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn query_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedbackRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT {} FROM feedback WHERE id IN ({}) {}",
            RECORD_COLUMNS, placeholders, NEWEST_FIRST
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<FeedbackRecord>> {
        let sql = format!("SELECT {} FROM feedback WHERE id = ?", RECORD_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn set_sentiment(&self, id: i64, sentiment: Sentiment) -> Result<Option<FeedbackRecord>> {
        let result = sqlx::query("UPDATE feedback SET sentiment = ? WHERE id = ?")
            .bind(sentiment.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn aggregate_counts(&self, field: CountField) -> Result<HashMap<String, i64>> {
        let column = match field {
            CountField::Source => "source",
            CountField::Sentiment => "sentiment",
        };
        let sql = format!(
            "SELECT {col} AS label, COUNT(*) AS n FROM feedback GROUP BY {col}",
            col = column
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let label: String = row.get("label");
            let n: i64 = row.get("n");
            counts.insert(label, n);
        }
        Ok(counts)
    }

    async fn count_all(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn count_since(&self, ts: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE created_at >= ?")
            .bind(ts)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
