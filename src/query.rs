//! Query planning: deterministic pagination and bounded batch retrieval.
//!
//! Both entry points ride on the store's fixed ordering (`created_at`
//! descending, id descending), so repeated calls with no intervening
//! writes return identical item order and no record moves between pages.

use anyhow::Result;

use crate::config::{Config, PaginationConfig};
use crate::db;
use crate::error::FeedbackError;
use crate::filter::{FeedbackFilter, FilterParams};
use crate::models::{format_ts_iso, FeedbackRecord};
use crate::sqlite_store::SqliteStore;
use crate::store::FeedbackStore;

/// One page of feedback plus the full matching count.
#[derive(Debug)]
pub struct PageResult {
    pub items: Vec<FeedbackRecord>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// What a bounded batch is resolved from.
///
/// A non-empty explicit id list takes precedence over predicate filters:
/// the filter is ignored entirely, not combined. Keeping the two arms in
/// one type makes that override a visible contract instead of an
/// incidental short-circuit.
#[derive(Debug, Clone, Copy)]
pub enum BatchSelection<'a> {
    Ids(&'a [i64]),
    Filter(&'a FeedbackFilter),
}

/// Fetch one page of matching records.
///
/// `page` is 1-indexed. `page_size` is clamped to the configured maximum;
/// requesting a page beyond the result count returns empty `items` with
/// the correct `total`.
pub async fn fetch_page(
    store: &dyn FeedbackStore,
    filter: &FeedbackFilter,
    page: i64,
    page_size: i64,
    pagination: &PaginationConfig,
) -> Result<PageResult, FeedbackError> {
    if page < 1 {
        return Err(FeedbackError::validation(
            "page",
            "page is 1-indexed and must be >= 1",
        ));
    }
    if page_size < 1 {
        return Err(FeedbackError::validation(
            "page_size",
            "page_size must be >= 1",
        ));
    }

    let page_size = page_size.min(pagination.max_page_size);
    let offset = (page - 1) * page_size;

    let (items, total) = store
        .query(filter, offset, page_size)
        .await
        .map_err(FeedbackError::StoreUnavailable)?;

    Ok(PageResult {
        items,
        total,
        page,
        page_size,
    })
}

/// Resolve an ordered batch of at most `limit` records for summarization.
///
/// Unknown ids are silently dropped; the resulting batch may therefore be
/// smaller than the id list, or empty.
pub async fn fetch_bounded(
    store: &dyn FeedbackStore,
    selection: BatchSelection<'_>,
    limit: i64,
) -> Result<Vec<FeedbackRecord>, FeedbackError> {
    let mut records = match selection {
        BatchSelection::Ids(ids) => store
            .query_by_ids(ids)
            .await
            .map_err(FeedbackError::StoreUnavailable)?,
        BatchSelection::Filter(filter) => {
            let (records, _) = store
                .query(filter, 0, limit)
                .await
                .map_err(FeedbackError::StoreUnavailable)?;
            records
        }
    };
    records.truncate(limit.max(0) as usize);
    Ok(records)
}

/// CLI entry point: print one page of matching feedback.
pub async fn run_list(
    config: &Config,
    params: &FilterParams,
    page: i64,
    page_size: Option<i64>,
) -> Result<()> {
    let filter = FeedbackFilter::from_params(params)?;
    let page_size = page_size.unwrap_or(config.pagination.default_page_size);

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let result = fetch_page(&store, &filter, page, page_size, &config.pagination).await?;

    if result.items.is_empty() {
        println!("No feedback.");
    } else {
        for record in &result.items {
            let date = format_ts_iso(record.created_at);
            println!(
                "#{} [{}] {} / {}",
                record.id, record.sentiment, record.source, date
            );
            println!("    \"{}\"", excerpt(&record.text));
        }
        println!();
        println!(
            "page {} of {} ({} total)",
            result.page,
            page_count(result.total, result.page_size),
            result.total
        );
    }

    store.pool().close().await;
    Ok(())
}

fn page_count(total: i64, page_size: i64) -> i64 {
    if total == 0 {
        1
    } else {
        (total + page_size - 1) / page_size
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let trimmed = flat.trim();
    if trimmed.chars().count() <= 120 {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(120).collect();
        format!("{}...", cut)
    }
}
