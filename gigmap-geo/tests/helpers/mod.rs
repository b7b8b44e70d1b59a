//! Test helpers for gigmap-geo
//!
//! Scripted geocoders with call recording, and an in-memory event source.

#![allow(dead_code)]

use gigmap_common::config::{GeocodingConfig, PacingConfig};
use gigmap_geo::models::EventRecord;
use gigmap_geo::services::event_source::apply_query;
use gigmap_geo::services::{
    EventQuery, EventSource, OverrideStore, ProviderChain, RateLimiter, ResolutionCache,
};
use gigmap_geo::workflow::Resolver;
use gigmap_geo::{Candidate, GeocodeError, GeocodeProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Geocoder answering from a fixed query → candidates table
pub struct FakeProvider {
    name: &'static str,
    responses: HashMap<String, Vec<Candidate>>,
    unavailable: bool,
    queries: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: HashMap::new(),
            unavailable: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, query: &str, candidates: Vec<Candidate>) -> Self {
        self.responses.insert(query.to_string(), candidates);
        self
    }

    /// Every search fails as if the network were down
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.unavailable {
            return Err(GeocodeError::ProviderUnavailable {
                provider: self.name,
                reason: "connection refused".to_string(),
            });
        }
        match self.responses.get(query) {
            Some(candidates) => Ok(candidates.clone()),
            None => Err(GeocodeError::NoCandidates { provider: self.name }),
        }
    }
}

/// Chain with no pacing delays
pub fn chain(primary: Option<Arc<FakeProvider>>, fallback: Arc<FakeProvider>) -> ProviderChain {
    let chain = ProviderChain::new(&GeocodingConfig::default(), &PacingConfig::immediate())
        .with_fallback(fallback);
    match primary {
        Some(provider) => chain.with_primary(provider),
        None => chain,
    }
}

pub fn resolver(overrides: OverrideStore, cache: ResolutionCache, chain: ProviderChain) -> Resolver {
    Resolver::new(overrides, cache, chain, RateLimiter::from_millis("event", 0))
}

/// Places-style candidate
pub fn place(lat: f64, lng: f64, address: &str, types: &[&str]) -> Candidate {
    Candidate::new(lat, lng, address).with_categories(types.iter().copied())
}

/// Open-geocoder-style candidate
pub fn osm(lat: f64, lng: f64, name: &str, class: &str, place_type: &str) -> Candidate {
    Candidate::new(lat, lng, name)
        .with_categories([place_type])
        .with_class(class)
}

/// Event source backed by a vector
pub struct StaticSource {
    records: Vec<EventRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl EventSource for StaticSource {
    async fn fetch(&self, query: &EventQuery) -> gigmap_common::Result<Vec<EventRecord>> {
        Ok(apply_query(self.records.clone(), query))
    }
}
