//! Ordered geocoding: places search first, then the open geocoder strategies
//!
//! The first usable candidate wins. Every failed attempt is kept as an
//! [`AttemptFailure`] so the run report can explain unresolved venues.

use crate::config::resolve_places_api_key;
use crate::error::GeocodeError;
use crate::models::{ConfidenceTier, Coordinate};
use crate::services::nominatim_client::NominatimClient;
use crate::services::places_client::PlacesClient;
use crate::services::rate_limiter::RateLimiter;
use crate::types::{Candidate, GeocodeProvider};
use gigmap_common::config::{GeocodingConfig, PacingConfig, TomlConfig};
use gigmap_common::time::millis_to_duration;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Places types treated as a plausible live-music venue
const COMMERCIAL_TYPES: [&str; 6] = [
    "bar",
    "restaurant",
    "night_club",
    "establishment",
    "food",
    "point_of_interest",
];

const DEFAULT_PRIMARY_TYPE: &str = "establishment";
const DEFAULT_FALLBACK_TYPE: &str = "unknown";
const AMENITY_CLASS: &str = "amenity";

/// The venue fields that drive query construction
#[derive(Debug, Clone, Copy)]
pub struct VenueTerms<'a> {
    pub venue: &'a str,
    pub locality: &'a str,
    pub city: &'a str,
}

impl<'a> VenueTerms<'a> {
    pub fn new(venue: &'a str, locality: &'a str, city: &'a str) -> Self {
        Self {
            venue: venue.trim(),
            locality: locality.trim(),
            city: city.trim(),
        }
    }

    fn has_locality(&self) -> bool {
        !self.locality.is_empty()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn join_present(terms: &[&str]) -> String {
    terms
        .iter()
        .filter(|t| !t.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds provider query strings from the configured geography
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    country: String,
    primary_region: String,
    coastal_region: String,
    coastal_localities: Vec<String>,
    coastal_region_extra: Vec<String>,
    venue_keywords: String,
}

impl QueryBuilder {
    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self {
            country: config.country.clone(),
            primary_region: config.primary_region.clone(),
            coastal_region: config.coastal_region.clone(),
            coastal_localities: config.coastal_localities.clone(),
            coastal_region_extra: config.coastal_region_extra.clone(),
            venue_keywords: config.venue_keywords.clone(),
        }
    }

    /// Locality is one of the beach resorts across the regional border
    pub fn is_coastal(&self, locality: &str) -> bool {
        self.coastal_localities
            .iter()
            .any(|c| contains_ignore_case(locality, c))
    }

    pub fn region_for(&self, locality: &str) -> &str {
        let in_coastal_region = self.is_coastal(locality)
            || self
                .coastal_region_extra
                .iter()
                .any(|c| contains_ignore_case(locality, c));
        if in_coastal_region {
            &self.coastal_region
        } else {
            &self.primary_region
        }
    }

    /// The single places-search query for a venue
    pub fn primary_query(&self, terms: &VenueTerms<'_>) -> String {
        if terms.has_locality() && self.is_coastal(terms.locality) {
            format!(
                "{}, {}, {}, {}",
                terms.locality, self.coastal_region, self.country, terms.venue
            )
        } else {
            format!(
                "{}, {}",
                join_present(&[terms.venue, terms.locality, terms.city]),
                self.country
            )
        }
    }
}

/// Open geocoder query strategies, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    /// `locality, region, country, venue`
    LocalityFirst,
    /// `venue, locality, city, country`
    VenueLocalityCity,
    /// `venue, locality, region, country`
    VenueLocalityRegion,
    /// `keywords venue, locality, region, country`
    KeywordVenue,
    /// `locality, region, country`; places the event in town at least
    LocalityOnly,
}

impl QueryStrategy {
    pub const ORDER: [QueryStrategy; 5] = [
        QueryStrategy::LocalityFirst,
        QueryStrategy::VenueLocalityCity,
        QueryStrategy::VenueLocalityRegion,
        QueryStrategy::KeywordVenue,
        QueryStrategy::LocalityOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStrategy::LocalityFirst => "locality_first",
            QueryStrategy::VenueLocalityCity => "venue_locality_city",
            QueryStrategy::VenueLocalityRegion => "venue_locality_region",
            QueryStrategy::KeywordVenue => "keyword_venue",
            QueryStrategy::LocalityOnly => "locality_only",
        }
    }

    /// Query text, or `None` when the strategy needs a locality and there
    /// is none
    pub fn build(&self, queries: &QueryBuilder, terms: &VenueTerms<'_>) -> Option<String> {
        let region = queries.region_for(terms.locality);
        let country = &queries.country;

        match self {
            QueryStrategy::LocalityFirst => terms.has_locality().then(|| {
                format!("{}, {}, {}, {}", terms.locality, region, country, terms.venue)
            }),
            QueryStrategy::VenueLocalityCity => Some(format!(
                "{}, {}",
                join_present(&[terms.venue, terms.locality, terms.city]),
                country
            )),
            QueryStrategy::VenueLocalityRegion => Some(format!(
                "{}, {}, {}",
                join_present(&[terms.venue, terms.locality]),
                region,
                country
            )),
            QueryStrategy::KeywordVenue => terms.has_locality().then(|| {
                format!(
                    "{} {}, {}, {}, {}",
                    queries.venue_keywords, terms.venue, terms.locality, region, country
                )
            }),
            QueryStrategy::LocalityOnly => terms
                .has_locality()
                .then(|| format!("{}, {}, {}", terms.locality, region, country)),
        }
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the places-search candidate for a venue
pub fn select_primary(candidates: &[Candidate], locality: &str) -> Option<Coordinate> {
    let exact = candidates
        .iter()
        .find(|c| contains_ignore_case(&c.display_name, locality.trim()));

    let (chosen, tier) = match exact {
        Some(candidate) => (candidate, ConfidenceTier::ProviderPrimaryExact),
        None => {
            let commercial = candidates.iter().find(|c| {
                c.categories
                    .iter()
                    .any(|t| COMMERCIAL_TYPES.contains(&t.as_str()))
            });
            (commercial.or(candidates.first())?, ConfidenceTier::ProviderPrimaryGeneric)
        }
    };

    let place_type = chosen
        .categories
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_PRIMARY_TYPE);

    Some(
        Coordinate::new(chosen.lat, chosen.lng, chosen.display_name.as_str(), place_type, tier)
            .with_provider_id(chosen.place_id.clone())
            .with_rating(chosen.rating),
    )
}

/// Pick the open-geocoder candidate: first amenity, else first ranked
pub fn select_fallback(candidates: &[Candidate]) -> Option<Coordinate> {
    let chosen = candidates
        .iter()
        .find(|c| c.class.as_deref() == Some(AMENITY_CLASS))
        .or(candidates.first())?;

    let tier = if candidates.len() > 1 {
        ConfidenceTier::ProviderFallbackMulti
    } else {
        ConfidenceTier::ProviderFallbackSingle
    };
    let place_type = chosen
        .categories
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_FALLBACK_TYPE);

    Some(Coordinate::new(
        chosen.lat,
        chosen.lng,
        chosen.display_name.as_str(),
        place_type,
        tier,
    ))
}

/// One failed provider attempt
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub provider: &'static str,
    /// `None` for the places-search attempt
    pub strategy: Option<QueryStrategy>,
    pub query: String,
    pub error: GeocodeError,
}

/// Result of running the chain for one venue
#[derive(Debug, Clone, Default)]
pub struct ChainOutcome {
    pub coordinate: Option<Coordinate>,
    pub failures: Vec<AttemptFailure>,
    /// Outbound provider requests made
    pub calls: usize,
}

struct ProviderSlot {
    provider: Arc<dyn GeocodeProvider>,
    limiter: RateLimiter,
}

impl ProviderSlot {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
        self.limiter.pace().await;
        match self.provider.search(query).await {
            Ok(candidates) if candidates.is_empty() => Err(GeocodeError::NoCandidates {
                provider: self.provider.name(),
            }),
            other => other,
        }
    }
}

/// Primary provider, then the fallback strategies
pub struct ProviderChain {
    queries: QueryBuilder,
    primary: Result<ProviderSlot, GeocodeError>,
    fallback: Option<ProviderSlot>,
    primary_interval: Duration,
    fallback_interval: Duration,
    /// Spacing between consecutive fallback strategies
    strategy_pacer: RateLimiter,
}

impl ProviderChain {
    /// Chain with no providers attached
    pub fn new(geocoding: &GeocodingConfig, pacing: &PacingConfig) -> Self {
        Self {
            queries: QueryBuilder::from_config(geocoding),
            primary: Err(GeocodeError::ConfigurationMissing {
                provider: "places",
                reason: "no primary provider attached".to_string(),
            }),
            fallback: None,
            primary_interval: millis_to_duration(pacing.primary_interval_ms),
            fallback_interval: millis_to_duration(pacing.fallback_interval_ms),
            strategy_pacer: RateLimiter::new("strategy", millis_to_duration(pacing.strategy_delay_ms)),
        }
    }

    /// Production chain: places search when a key is configured, and the
    /// open geocoder
    pub fn from_config(config: &TomlConfig) -> Self {
        let chain = Self::new(&config.geocoding, &config.pacing);

        let primary = resolve_places_api_key(config)
            .and_then(|key| PlacesClient::new(key, &config.geocoding));
        let chain = match primary {
            Ok(client) => chain.with_primary(Arc::new(client)),
            Err(e) => {
                warn!("{}; using the open geocoder only", e);
                chain.without_primary(e)
            }
        };

        match NominatimClient::new(&config.geocoding) {
            Ok(client) => chain.with_fallback(Arc::new(client)),
            Err(e) => {
                warn!("{}; fallback geocoding disabled", e);
                chain
            }
        }
    }

    pub fn with_primary(mut self, provider: Arc<dyn GeocodeProvider>) -> Self {
        self.primary = Ok(ProviderSlot {
            limiter: RateLimiter::new(provider.name(), self.primary_interval),
            provider,
        });
        self
    }

    /// Record why the primary provider is unavailable
    pub fn without_primary(mut self, reason: GeocodeError) -> Self {
        self.primary = Err(reason);
        self
    }

    pub fn with_fallback(mut self, provider: Arc<dyn GeocodeProvider>) -> Self {
        self.fallback = Some(ProviderSlot {
            limiter: RateLimiter::new(provider.name(), self.fallback_interval),
            provider,
        });
        self
    }

    /// Resolve one venue; absent coordinate when every attempt failed
    pub async fn resolve(&self, terms: &VenueTerms<'_>) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        if terms.venue.is_empty() {
            debug!("Empty venue name, nothing to geocode");
            return outcome;
        }

        let query = self.queries.primary_query(terms);
        match &self.primary {
            Ok(slot) => {
                outcome.calls += 1;
                let result = slot.search(&query).await.and_then(|candidates| {
                    select_primary(&candidates, terms.locality).ok_or(GeocodeError::NoCandidates {
                        provider: slot.provider.name(),
                    })
                });
                match result {
                    Ok(coordinate) => {
                        info!(
                            venue = %terms.venue,
                            tier = %coordinate.confidence(),
                            "Found via {}",
                            slot.provider.name()
                        );
                        outcome.coordinate = Some(coordinate);
                        return outcome;
                    }
                    Err(error) => {
                        debug!(venue = %terms.venue, query = %query, "{}", error);
                        outcome.failures.push(AttemptFailure {
                            provider: error.provider(),
                            strategy: None,
                            query,
                            error,
                        });
                    }
                }
            }
            Err(missing) => outcome.failures.push(AttemptFailure {
                provider: missing.provider(),
                strategy: None,
                query,
                error: missing.clone(),
            }),
        }

        let Some(slot) = &self.fallback else {
            return outcome;
        };

        for strategy in QueryStrategy::ORDER {
            let Some(query) = strategy.build(&self.queries, terms) else {
                continue;
            };
            self.strategy_pacer.pace().await;
            outcome.calls += 1;

            let result = slot.search(&query).await.and_then(|candidates| {
                select_fallback(&candidates).ok_or(GeocodeError::NoCandidates {
                    provider: slot.provider.name(),
                })
            });
            match result {
                Ok(coordinate) => {
                    info!(
                        venue = %terms.venue,
                        strategy = %strategy,
                        tier = %coordinate.confidence(),
                        "Found via {}",
                        slot.provider.name()
                    );
                    outcome.coordinate = Some(coordinate);
                    return outcome;
                }
                Err(error) => {
                    debug!(venue = %terms.venue, strategy = %strategy, query = %query, "{}", error);
                    outcome.failures.push(AttemptFailure {
                        provider: error.provider(),
                        strategy: Some(strategy),
                        query,
                        error,
                    });
                }
            }
        }

        warn!(
            venue = %terms.venue,
            attempts = outcome.failures.len(),
            "No coordinates found"
        );
        outcome
    }
}
