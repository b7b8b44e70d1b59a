//! Run drivers for the published datasets
//!
//! Events are processed strictly one at a time. A failed resolution never
//! stops the batch; only the record store and the final writes are fatal.
//!
//! # Example
//! ```rust,ignore
//! let mut pipeline = MapPipeline::new(Resolver::from_config(&config), &config);
//! let report = pipeline.run(&source, &EventQuery::past(today())).await?;
//! ```

use super::resolver::Resolver;
use crate::models::{ConfidenceTier, ListingEntry, MapRecord, ResolvedEvent};
use crate::services::event_source::{EventQuery, EventSource};
use crate::services::provider_chain::AttemptFailure;
use crate::services::result_assembler::{assemble, listing_entry, map_record};
use gigmap_common::config::TomlConfig;
use gigmap_common::persist::{read_json_records, write_json_atomic};
use gigmap_common::Result;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// An event that ended the run without coordinates
#[derive(Debug, Clone)]
pub struct UnresolvedEvent {
    pub id: String,
    pub venue: String,
    pub attempts: Vec<AttemptFailure>,
}

/// Outcome of a map run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total: usize,
    pub by_tier: BTreeMap<ConfidenceTier, usize>,
    pub unresolved: Vec<UnresolvedEvent>,
    pub provider_calls: usize,
    pub map_records: usize,
    /// Records kept from the previous raw dataset without being processed
    pub carried: usize,
}

impl RunReport {
    pub fn count(&self, tier: ConfidenceTier) -> usize {
        self.by_tier.get(&tier).copied().unwrap_or(0)
    }

    pub fn log_summary(&self) {
        info!(
            total = self.total,
            mapped = self.map_records,
            provider_calls = self.provider_calls,
            carried = self.carried,
            "Map run complete"
        );
        for (tier, count) in self.by_tier.iter().rev() {
            info!(tier = %tier, count, "Resolved");
        }
        for event in &self.unresolved {
            warn!(
                id = %event.id,
                venue = %event.venue,
                attempts = event.attempts.len(),
                "Unresolved; add a manual override"
            );
        }
    }
}

/// Builds the past-events raw and map datasets
pub struct MapPipeline {
    resolver: Resolver,
    raw_path: PathBuf,
    map_path: PathBuf,
}

impl MapPipeline {
    pub fn new(resolver: Resolver, config: &TomlConfig) -> Self {
        Self::with_paths(resolver, config.raw_dataset_path(), config.map_dataset_path())
    }

    pub fn with_paths(resolver: Resolver, raw_path: PathBuf, map_path: PathBuf) -> Self {
        Self {
            resolver,
            raw_path,
            map_path,
        }
    }

    pub async fn run(&mut self, source: &dyn EventSource, query: &EventQuery) -> Result<RunReport> {
        let records = source.fetch(query).await?;
        info!(events = records.len(), "Resolving venue coordinates");

        let mut report = RunReport {
            total: records.len(),
            ..RunReport::default()
        };
        let mut resolved_events: Vec<ResolvedEvent> = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let resolution = self.resolver.resolve(record).await;
            let tier = resolution.confidence();

            tracing::debug!(
                progress = %format!("{}/{}", i + 1, records.len()),
                id = %record.id,
                venue = %record.venue_name,
                tier = %tier,
                "Event processed"
            );

            *report.by_tier.entry(tier).or_insert(0) += 1;
            report.provider_calls += resolution.provider_calls;
            if resolution.coordinate.is_none() {
                report.unresolved.push(UnresolvedEvent {
                    id: record.id.clone(),
                    venue: record.venue_name.clone(),
                    attempts: resolution.failures,
                });
            }

            resolved_events.push(assemble(record, resolution.coordinate, resolution.cleared_flags));
        }

        // A full run rewrites the dataset from the record store
        if query.limit.is_some() {
            let carried = self.carried_records(&resolved_events);
            report.carried = carried.len();
            if !carried.is_empty() {
                info!(carried = carried.len(), "Keeping events outside the limit");
            }
            resolved_events.extend(carried);
        }

        let map_records: Vec<MapRecord> = resolved_events
            .iter()
            .filter(|event| !event.venue.is_empty())
            .filter_map(map_record)
            .collect();
        report.map_records = map_records.len();

        write_json_atomic(&self.raw_path, &resolved_events)?;
        write_json_atomic(&self.map_path, &map_records)?;
        info!(
            raw = %self.raw_path.display(),
            map = %self.map_path.display(),
            "Datasets written"
        );

        Ok(report)
    }

    /// Previous raw records, and cache-only entries, for events this run
    /// did not process
    ///
    /// A limited run must not erase the coordinates and cleared flags of
    /// the events it skipped. Cache-only entries (seeded from an older map
    /// file) keep just their coordinate and flags and stay off the map.
    fn carried_records(&self, processed: &[ResolvedEvent]) -> Vec<ResolvedEvent> {
        let mut seen: HashSet<String> = processed.iter().map(|event| event.id.clone()).collect();

        let previous: Vec<ResolvedEvent> = if self.raw_path.exists() {
            read_json_records(&self.raw_path).unwrap_or_else(|e| {
                warn!(path = %self.raw_path.display(), "Previous raw dataset unreadable: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };

        let mut carried: Vec<ResolvedEvent> = previous
            .into_iter()
            .filter(|event| seen.insert(event.id.clone()))
            .collect();

        let mut cache_only: Vec<ResolvedEvent> = self
            .resolver
            .cache()
            .entries()
            .filter(|(id, _)| !seen.contains(*id))
            .map(|(id, entry)| ResolvedEvent {
                id: id.to_string(),
                date: String::new(),
                time: String::new(),
                venue: String::new(),
                location: String::new(),
                city: String::new(),
                address: String::new(),
                notes: String::new(),
                coordinates: Some(entry.coordinate.clone()),
                confidence: entry.coordinate.confidence(),
                cleared_flags: entry.cleared_flags.clone(),
            })
            .collect();
        cache_only.sort_by(|a, b| a.id.cmp(&b.id));
        carried.extend(cache_only);

        carried
    }
}

/// Build and write the upcoming-events listing; returns the entry count
pub async fn build_listing(
    source: &dyn EventSource,
    query: &EventQuery,
    output: &Path,
) -> Result<usize> {
    let records = source.fetch(query).await?;
    let entries: Vec<ListingEntry> = records.iter().filter_map(listing_entry).collect();

    write_json_atomic(output, &entries)?;
    info!(entries = entries.len(), path = %output.display(), "Listing written");
    Ok(entries.len())
}
