//! Validated, immutable filter criteria.
//!
//! Raw filter input arrives as loose strings from the CLI or HTTP layer and
//! is normalized exactly once, at the boundary, into a [`FeedbackFilter`].
//! Downstream components only ever consume the typed form; no partially
//! valid filter can be constructed.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::error::FeedbackError;
use crate::models::{FeedbackRecord, Sentiment, Source};

/// Untyped filter input as it arrives from callers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub source: Option<String>,
    pub sentiment: Option<String>,
    /// Inclusive lower bound on `created_at`. `YYYY-MM-DD` or RFC 3339.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `created_at`. `YYYY-MM-DD` or RFC 3339.
    /// A date-only bound means the end of that day.
    pub end_date: Option<String>,
}

/// A validated set of optional predicates over feedback records.
///
/// All predicates combine with logical AND; the empty filter matches every
/// record. Value-equal and immutable once constructed: the only way in is
/// [`FeedbackFilter::from_params`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    search: Option<String>,
    source: Option<Source>,
    sentiment: Option<Sentiment>,
    start_ts: Option<i64>,
    end_ts: Option<i64>,
}

impl FeedbackFilter {
    /// Validate and normalize raw parameters.
    ///
    /// Rejects unknown `source`/`sentiment` values, malformed dates, and
    /// `start_date > end_date`, naming the offending field.
    pub fn from_params(params: &FilterParams) -> Result<FeedbackFilter, FeedbackError> {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let source = match normalize(&params.source) {
            Some(raw) => Some(Source::parse(raw).ok_or_else(|| {
                FeedbackError::validation(
                    "source",
                    format!("unknown source '{}'; expected one of: {}", raw, Source::vocabulary()),
                )
            })?),
            None => None,
        };

        let sentiment = match normalize(&params.sentiment) {
            Some(raw) => Some(Sentiment::parse(raw).ok_or_else(|| {
                FeedbackError::validation(
                    "sentiment",
                    format!(
                        "unknown sentiment '{}'; expected one of: {}",
                        raw,
                        Sentiment::vocabulary()
                    ),
                )
            })?),
            None => None,
        };

        let start_ts = match normalize(&params.start_date) {
            Some(raw) => Some(
                parse_date_bound(raw, DayBound::Start)
                    .ok_or_else(|| FeedbackError::validation("start_date", bad_date(raw)))?,
            ),
            None => None,
        };

        let end_ts = match normalize(&params.end_date) {
            Some(raw) => Some(
                parse_date_bound(raw, DayBound::End)
                    .ok_or_else(|| FeedbackError::validation("end_date", bad_date(raw)))?,
            ),
            None => None,
        };

        if let (Some(start), Some(end)) = (start_ts, end_ts) {
            if start > end {
                return Err(FeedbackError::validation(
                    "start_date",
                    "start_date is after end_date",
                ));
            }
        }

        Ok(FeedbackFilter {
            search,
            source,
            sentiment,
            start_ts,
            end_ts,
        })
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn source(&self) -> Option<Source> {
        self.source
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn start_ts(&self) -> Option<i64> {
        self.start_ts
    }

    pub fn end_ts(&self) -> Option<i64> {
        self.end_ts
    }

    pub fn is_empty(&self) -> bool {
        *self == FeedbackFilter::default()
    }

    /// Evaluate the predicates against one record.
    ///
    /// This is the reference semantics; the SQLite store compiles the same
    /// predicates into WHERE clauses.
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        if let Some(search) = &self.search {
            if !record
                .text
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(source) = self.source {
            if record.source != source {
                return false;
            }
        }
        if let Some(sentiment) = self.sentiment {
            if record.sentiment != sentiment {
                return false;
            }
        }
        if let Some(start) = self.start_ts {
            if record.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_ts {
            if record.created_at > end {
                return false;
            }
        }
        true
    }
}

fn normalize(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn bad_date(raw: &str) -> String {
    format!(
        "malformed date '{}'; expected YYYY-MM-DD or an RFC 3339 datetime",
        raw
    )
}

enum DayBound {
    Start,
    End,
}

/// Parse a date bound into Unix seconds. Date-only input expands to the
/// start or end of that day so both bounds stay inclusive.
fn parse_date_bound(raw: &str, bound: DayBound) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        DayBound::Start => date.and_hms_opt(0, 0, 0)?,
        DayBound::End => date.and_hms_opt(23, 59, 59)?,
    };
    Some(time.and_utc().timestamp())
}
