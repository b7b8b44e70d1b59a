//! Provider credential resolution for gigmap-geo
//!
//! The places API key is resolved ENV → TOML. Without a key the places
//! provider is skipped and every venue goes to the open geocoder.

use crate::error::GeocodeError;
use gigmap_common::config::TomlConfig;
use tracing::{info, warn};

/// Environment variable holding the places API key
pub const PLACES_API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";

/// Resolve the places API key
///
/// **Priority:** ENV → TOML
pub fn resolve_places_api_key(toml_config: &TomlConfig) -> Result<String, GeocodeError> {
    let env_key = std::env::var(PLACES_API_KEY_ENV)
        .ok()
        .filter(|key| is_valid_key(key));
    let toml_key = toml_config
        .places_api_key
        .as_ref()
        .filter(|key| is_valid_key(key));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Places API key found in multiple sources: environment, TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Places API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Places API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(GeocodeError::ConfigurationMissing {
        provider: "places",
        reason: format!(
            "API key not set ({} or places_api_key in the TOML config)",
            PLACES_API_KEY_ENV
        ),
    })
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("AIza-123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }
}
