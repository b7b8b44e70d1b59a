//! Places text-search client (primary provider)
//!
//! Rich venue search with category tags and ratings. Requires an API key;
//! without one the provider chain skips straight to the open geocoder.

use crate::error::GeocodeError;
use crate::models::is_valid_position;
use crate::types::{Candidate, GeocodeProvider};
use gigmap_common::config::GeocodingConfig;
use serde::Deserialize;
use std::time::Duration;

const PLACES_TEXTSEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const PROVIDER: &str = "places";

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlacesResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacesResult {
    geometry: PlacesGeometry,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlacesGeometry {
    location: PlacesLocation,
}

#[derive(Debug, Deserialize)]
struct PlacesLocation {
    lat: f64,
    lng: f64,
}

/// Places text-search client
pub struct PlacesClient {
    http_client: reqwest::Client,
    api_key: String,
    region: String,
    language: String,
}

impl PlacesClient {
    pub fn new(api_key: String, config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        if !crate::config::is_valid_key(&api_key) {
            return Err(GeocodeError::ConfigurationMissing {
                provider: PROVIDER,
                reason: "empty API key".to_string(),
            });
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GeocodeError::ProviderUnavailable {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            api_key,
            region: config.country_code.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for PlacesClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
        tracing::debug!(query = %query, "Querying places search");

        let params = [
            ("query", query),
            ("key", self.api_key.as_str()),
            ("region", self.region.as_str()),
            ("language", self.language.as_str()),
        ];

        let response = self
            .http_client
            .get(PLACES_TEXTSEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| GeocodeError::ProviderUnavailable {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::ProviderUnavailable {
                provider: PROVIDER,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let body: PlacesResponse =
            response
                .json()
                .await
                .map_err(|e| GeocodeError::ProviderUnavailable {
                    provider: PROVIDER,
                    reason: format!("parse error: {}", e),
                })?;

        candidates_from_response(body)
    }
}

fn candidates_from_response(body: PlacesResponse) -> Result<Vec<Candidate>, GeocodeError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoCandidates { provider: PROVIDER }),
        other => {
            return Err(GeocodeError::ProviderUnavailable {
                provider: PROVIDER,
                reason: match body.error_message {
                    Some(message) => format!("{} - {}", other, message),
                    None => other.to_string(),
                },
            })
        }
    }

    let candidates: Vec<Candidate> = body
        .results
        .into_iter()
        .filter_map(|result| {
            let PlacesLocation { lat, lng } = result.geometry.location;
            if !is_valid_position(lat, lng) {
                tracing::debug!(lat, lng, "Dropping candidate with out-of-range position");
                return None;
            }
            Some(Candidate {
                lat,
                lng,
                display_name: result
                    .formatted_address
                    .or(result.name)
                    .unwrap_or_default(),
                categories: result.types,
                class: None,
                place_id: result.place_id,
                rating: result.rating,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err(GeocodeError::NoCandidates { provider: PROVIDER });
    }
    Ok(candidates)
}
