//! Event record store seam
//!
//! The concert database is exported to a JSON file; `JsonFileSource` reads
//! that export and applies the date window and ordering locally.

use crate::models::EventRecord;
use chrono::NaiveDate;
use gigmap_common::time::parse_event_date;
use gigmap_common::{Error, Result};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Date window and ordering for a fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    /// Exclusive upper bound
    pub before: Option<NaiveDate>,
    /// Inclusive lower bound
    pub on_or_after: Option<NaiveDate>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Events before `today`, most recent first
    pub fn past(today: NaiveDate) -> Self {
        Self {
            before: Some(today),
            order: SortOrder::Descending,
            ..Self::default()
        }
    }

    /// Events from `today` on, soonest first
    pub fn upcoming(today: NaiveDate) -> Self {
        Self {
            on_or_after: Some(today),
            order: SortOrder::Ascending,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn is_windowed(&self) -> bool {
        self.before.is_some() || self.on_or_after.is_some()
    }

    fn admits(&self, date: NaiveDate) -> bool {
        self.before.map_or(true, |before| date < before)
            && self.on_or_after.map_or(true, |from| date >= from)
    }
}

/// Supplies event records
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Records matching `query`, in the requested order
    async fn fetch(&self, query: &EventQuery) -> Result<Vec<EventRecord>>;
}

/// Reads a JSON array export of the record store
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Filter, sort and truncate records per `query`
pub fn apply_query(records: Vec<EventRecord>, query: &EventQuery) -> Vec<EventRecord> {
    let mut dated: Vec<(Option<NaiveDate>, EventRecord)> = records
        .into_iter()
        .map(EventRecord::normalized)
        .filter_map(|record| {
            let date = parse_event_date(&record.date);
            if query.is_windowed() {
                match date {
                    Some(d) if query.admits(d) => {}
                    Some(_) => return None,
                    None => {
                        warn!(id = %record.id, date = %record.date, "Skipping event with unparseable date");
                        return None;
                    }
                }
            }
            Some((date, record))
        })
        .collect();

    dated.sort_by(|(a_date, a), (b_date, b)| {
        let ordering = a_date.cmp(b_date).then_with(|| a.date.cmp(&b.date));
        match query.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });

    let limit = query.limit.unwrap_or(usize::MAX);
    dated.into_iter().take(limit).map(|(_, record)| record).collect()
}

#[async_trait::async_trait]
impl EventSource for JsonFileSource {
    async fn fetch(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Source(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let records: Vec<EventRecord> = serde_json::from_str(&content).map_err(|e| {
            Error::Source(format!("malformed event export {}: {}", self.path.display(), e))
        })?;

        let total = records.len();
        let selected = apply_query(records, query);
        info!(
            path = %self.path.display(),
            total,
            selected = selected.len(),
            "Fetched events"
        );
        Ok(selected)
    }
}
