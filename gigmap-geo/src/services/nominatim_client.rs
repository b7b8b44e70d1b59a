//! Open geocoder client (fallback provider)
//!
//! No key needed, but the usage policy requires a descriptive User-Agent and
//! at most one request per second. Pacing is applied by the provider chain.

use crate::error::GeocodeError;
use crate::models::is_valid_position;
use crate::types::{Candidate, GeocodeProvider};
use gigmap_common::config::GeocodingConfig;
use serde::Deserialize;
use std::time::Duration;

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const PROVIDER: &str = "nominatim";

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    class: Option<String>,
}

/// Open geocoder search client
pub struct NominatimClient {
    http_client: reqwest::Client,
    limit: String,
    country_codes: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        if config.user_agent.trim().is_empty() {
            return Err(GeocodeError::ConfigurationMissing {
                provider: PROVIDER,
                reason: "a descriptive User-Agent is required".to_string(),
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
            limit: config.fallback_result_limit.max(1).to_string(),
            country_codes: config.country_code.clone(),
        })
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for NominatimClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
        tracing::debug!(query = %query, "Querying open geocoder");

        let params = [
            ("format", "json"),
            ("q", query),
            ("limit", self.limit.as_str()),
            ("countrycodes", self.country_codes.as_str()),
            ("addressdetails", "1"),
        ];

        let response = self
            .http_client
            .get(NOMINATIM_SEARCH_URL)
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

        let places: Vec<NominatimPlace> =
            response
                .json()
                .await
                .map_err(|e| GeocodeError::ProviderUnavailable {
                    provider: PROVIDER,
                    reason: format!("parse error: {}", e),
                })?;

        candidates_from_places(places)
    }
}

fn candidates_from_places(places: Vec<NominatimPlace>) -> Result<Vec<Candidate>, GeocodeError> {
    let candidates: Vec<Candidate> = places
        .into_iter()
        .filter_map(|place| {
            let (Ok(lat), Ok(lng)) = (place.lat.trim().parse::<f64>(), place.lon.trim().parse::<f64>())
            else {
                tracing::debug!(lat = %place.lat, lon = %place.lon, "Dropping candidate with unparseable position");
                return None;
            };
            // f64 parsing accepts "NaN" and "inf"
            if !is_valid_position(lat, lng) {
                tracing::debug!(lat = %place.lat, lon = %place.lon, "Dropping candidate with out-of-range position");
                return None;
            }
            Some(Candidate {
                lat,
                lng,
                display_name: place.display_name,
                categories: place.place_type.into_iter().collect(),
                class: place.class,
                place_id: None,
                rating: None,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err(GeocodeError::NoCandidates { provider: PROVIDER });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Candidate>, GeocodeError> {
        candidates_from_places(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_string_positions_are_parsed() {
        let candidates = parse(
            r#"[
                {"lat": "45.8162", "lon": "13.3549", "display_name": "Bisboccia, Cervignano del Friuli", "type": "pub", "class": "amenity"}
            ]"#,
        )
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].lat, 45.8162);
        assert_eq!(candidates[0].lng, 13.3549);
        assert_eq!(candidates[0].categories, vec!["pub".to_string()]);
        assert_eq!(candidates[0].class.as_deref(), Some("amenity"));
    }

    #[test]
    fn test_unparseable_positions_are_dropped() {
        let candidates = parse(
            r#"[
                {"lat": "n/a", "lon": "13.0", "display_name": "Broken"},
                {"lat": "46.06", "lon": "13.23", "display_name": "Udine", "type": "city", "class": "place"}
            ]"#,
        )
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "Udine");
    }

    #[test]
    fn test_non_finite_and_out_of_range_positions_are_dropped() {
        let candidates = parse(
            r#"[
                {"lat": "NaN", "lon": "13.0", "display_name": "Not a number"},
                {"lat": "45.0", "lon": "inf", "display_name": "Infinite"},
                {"lat": "-95.0", "lon": "13.0", "display_name": "Below the pole"},
                {"lat": "45.6", "lon": "12.88", "display_name": "Caorle", "type": "town", "class": "place"}
            ]"#,
        )
        .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "Caorle");

        assert_eq!(
            parse(r#"[{"lat": "nan", "lon": "-inf", "display_name": "Only junk"}]"#),
            Err(GeocodeError::NoCandidates { provider: PROVIDER })
        );
    }

    #[test]
    fn test_empty_list_is_no_candidates() {
        assert_eq!(parse("[]"), Err(GeocodeError::NoCandidates { provider: PROVIDER }));
    }

    #[test]
    fn test_blank_user_agent_is_configuration_missing() {
        let config = GeocodingConfig {
            user_agent: String::new(),
            ..GeocodingConfig::default()
        };
        assert!(matches!(
            NominatimClient::new(&config),
            Err(GeocodeError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn test_client_creation() {
        assert!(NominatimClient::new(&GeocodingConfig::default()).is_ok());
    }
}
