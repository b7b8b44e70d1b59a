//! Per-event coordinate resolution
//!
//! Order: manual override, then the previous run's coordinate (unless a
//! pending known-incorrect flag matches the venue), then the provider chain
//! with the canonical venue name.

use crate::models::{ConfidenceTier, Coordinate, EventRecord};
use crate::services::provider_chain::{AttemptFailure, ProviderChain, VenueTerms};
use crate::services::rate_limiter::RateLimiter;
use crate::services::{AliasResolver, OverrideStore, ResolutionCache};
use gigmap_common::config::TomlConfig;
use tracing::{debug, info};

/// Which stage produced the coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    Override,
    Cache,
    Provider,
    Unresolved,
}

/// Resolution of one event
#[derive(Debug, Clone)]
pub struct Resolution {
    pub coordinate: Option<Coordinate>,
    pub stage: ResolutionStage,
    /// Flags honoured for this event so far, carried into the output
    pub cleared_flags: Vec<String>,
    pub failures: Vec<AttemptFailure>,
    pub provider_calls: usize,
}

impl Resolution {
    pub fn confidence(&self) -> ConfidenceTier {
        self.coordinate
            .as_ref()
            .map(Coordinate::confidence)
            .unwrap_or(ConfidenceTier::Unresolved)
    }
}

pub struct Resolver {
    overrides: OverrideStore,
    aliases: AliasResolver,
    cache: ResolutionCache,
    chain: ProviderChain,
    event_pacer: RateLimiter,
}

impl Resolver {
    pub fn new(
        overrides: OverrideStore,
        cache: ResolutionCache,
        chain: ProviderChain,
        event_pacer: RateLimiter,
    ) -> Self {
        let aliases = AliasResolver::new(overrides.aliases().clone());
        if !aliases.is_empty() {
            debug!(canonical_venues = aliases.len(), "Venue aliases active");
        }
        Self {
            overrides,
            aliases,
            cache,
            chain,
            event_pacer,
        }
    }

    /// Load the stores named by the config; missing stores start empty
    pub fn from_config(config: &TomlConfig) -> Self {
        let overrides = OverrideStore::load_or_empty(&config.overrides_path());

        let raw_path = config.raw_dataset_path();
        let map_path = config.map_dataset_path();
        let cache = if raw_path.exists() || !map_path.exists() {
            ResolutionCache::load_or_empty(&raw_path)
        } else {
            debug!(path = %map_path.display(), "No raw dataset yet, seeding cache from map dataset");
            ResolutionCache::load_or_empty(&map_path)
        };

        Self::new(
            overrides,
            cache,
            ProviderChain::from_config(config),
            RateLimiter::from_millis("event", config.pacing.event_delay_ms),
        )
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub async fn resolve(&mut self, record: &EventRecord) -> Resolution {
        let venue = record.venue_name.trim();
        let event_id = record.id.as_str();

        if venue.is_empty() {
            debug!(id = %event_id, "Event without venue name");
            return self.finish(event_id, None, ResolutionStage::Unresolved, Vec::new(), 0);
        }

        if let Some(coordinate) = self.overrides.lookup(venue) {
            debug!(id = %event_id, venue = %venue, "Using manual override");
            return self.finish(event_id, Some(coordinate), ResolutionStage::Override, Vec::new(), 0);
        }

        let pending: Vec<String> = self
            .overrides
            .known_incorrect(venue)
            .into_iter()
            .filter(|flag| !self.cache.has_cleared(event_id, &flag.id))
            .map(|flag| flag.id.clone())
            .collect();

        if pending.is_empty() {
            if let Some(cached) = self.cache.get(event_id) {
                let coordinate = cached.retiered(ConfidenceTier::Cached);
                return self.finish(event_id, Some(coordinate), ResolutionStage::Cache, Vec::new(), 0);
            }
        } else {
            info!(
                id = %event_id,
                venue = %venue,
                flags = ?pending,
                "Known-incorrect flag matched, re-resolving"
            );
        }

        let canonical = self.aliases.normalize(venue).to_string();
        let terms = VenueTerms::new(&canonical, &record.locality, &record.city);

        self.event_pacer.pace().await;
        let outcome = self.chain.resolve(&terms).await;

        match &outcome.coordinate {
            Some(coordinate) => self.cache.put(event_id, coordinate.clone()),
            None if !pending.is_empty() => self.cache.invalidate(event_id),
            None => {}
        }
        self.cache.clear_flags(event_id, &pending);

        let stage = if outcome.coordinate.is_some() {
            ResolutionStage::Provider
        } else {
            ResolutionStage::Unresolved
        };
        self.finish(event_id, outcome.coordinate, stage, outcome.failures, outcome.calls)
    }

    fn finish(
        &self,
        event_id: &str,
        coordinate: Option<Coordinate>,
        stage: ResolutionStage,
        failures: Vec<AttemptFailure>,
        provider_calls: usize,
    ) -> Resolution {
        Resolution {
            coordinate,
            stage,
            cleared_flags: self.cache.cleared_flags(event_id).to_vec(),
            failures,
            provider_calls,
        }
    }
}
