//! Resolved coordinates and their confidence tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a coordinate was obtained
///
/// Variants are declared lowest first so the derived `Ord` ranks `Manual`
/// highest. Legacy labels written by older map files are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// No coordinate could be produced
    Unresolved,
    /// Open geocoder, exactly one candidate
    #[serde(alias = "single_result")]
    ProviderFallbackSingle,
    /// Open geocoder, several candidates
    #[serde(alias = "multiple_results")]
    ProviderFallbackMulti,
    /// Places search, locality not confirmed in the address
    #[serde(alias = "google_places")]
    ProviderPrimaryGeneric,
    /// Places search, address contains the expected locality
    ProviderPrimaryExact,
    /// Reused from a previous run
    Cached,
    /// Human override
    Manual,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Unresolved => "unresolved",
            ConfidenceTier::ProviderFallbackSingle => "provider_fallback_single",
            ConfidenceTier::ProviderFallbackMulti => "provider_fallback_multi",
            ConfidenceTier::ProviderPrimaryGeneric => "provider_primary_generic",
            ConfidenceTier::ProviderPrimaryExact => "provider_primary_exact",
            ConfidenceTier::Cached => "cached",
            ConfidenceTier::Manual => "manual",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_place_type() -> String {
    "unknown".to_string()
}

/// A map position for one venue
///
/// Fields are private: a coordinate never changes once built. Re-resolution
/// and re-tiering produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
    display_name: String,
    #[serde(rename = "type", default = "default_place_type")]
    place_type: String,
    confidence: ConfidenceTier,
    #[serde(rename = "place_id", default, skip_serializing_if = "Option::is_none")]
    provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
}

impl Coordinate {
    pub fn new(
        lat: f64,
        lng: f64,
        display_name: impl Into<String>,
        place_type: impl Into<String>,
        confidence: ConfidenceTier,
    ) -> Self {
        Self {
            lat,
            lng,
            display_name: display_name.into(),
            place_type: place_type.into(),
            confidence,
            provider_id: None,
            rating: None,
        }
    }

    pub fn with_provider_id(mut self, provider_id: Option<String>) -> Self {
        self.provider_id = provider_id;
        self
    }

    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }

    /// Same position under a different tier (e.g. reused from cache)
    pub fn retiered(&self, confidence: ConfidenceTier) -> Self {
        Self {
            confidence,
            ..self.clone()
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn place_type(&self) -> &str {
        &self.place_type
    }

    pub fn confidence(&self) -> ConfidenceTier {
        self.confidence
    }

    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }
}

/// Finite latitude in [-90, 90] and longitude in [-180, 180]
pub fn is_valid_position(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}
