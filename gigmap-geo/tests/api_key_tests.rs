//! Places API key resolution (ENV → TOML)

use gigmap_common::config::TomlConfig;
use gigmap_geo::config::{resolve_places_api_key, PLACES_API_KEY_ENV};
use gigmap_geo::services::{ProviderChain, VenueTerms};
use gigmap_geo::GeocodeError;
use serial_test::serial;

fn config_with_key(key: Option<&str>) -> TomlConfig {
    TomlConfig {
        places_api_key: key.map(str::to_string),
        ..TomlConfig::default()
    }
}

#[test]
#[serial]
fn test_env_key_wins_over_toml() {
    std::env::set_var(PLACES_API_KEY_ENV, "env-key");
    let key = resolve_places_api_key(&config_with_key(Some("toml-key")));
    std::env::remove_var(PLACES_API_KEY_ENV);

    assert_eq!(key.unwrap(), "env-key");
}

#[test]
#[serial]
fn test_toml_key_used_without_env() {
    std::env::remove_var(PLACES_API_KEY_ENV);
    let key = resolve_places_api_key(&config_with_key(Some("toml-key")));

    assert_eq!(key.unwrap(), "toml-key");
}

#[test]
#[serial]
fn test_blank_env_key_falls_through_to_toml() {
    std::env::set_var(PLACES_API_KEY_ENV, "   ");
    let key = resolve_places_api_key(&config_with_key(Some("toml-key")));
    std::env::remove_var(PLACES_API_KEY_ENV);

    assert_eq!(key.unwrap(), "toml-key");
}

#[test]
#[serial]
fn test_missing_key_is_configuration_missing() {
    std::env::remove_var(PLACES_API_KEY_ENV);
    let result = resolve_places_api_key(&config_with_key(Some("")));

    match result {
        Err(GeocodeError::ConfigurationMissing { provider, reason }) => {
            assert_eq!(provider, "places");
            assert!(reason.contains(PLACES_API_KEY_ENV));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_chain_without_key_still_builds() {
    std::env::remove_var(PLACES_API_KEY_ENV);
    let chain = ProviderChain::from_config(&config_with_key(None));

    // An empty venue never reaches a provider
    let outcome = chain.resolve(&VenueTerms::new("", "Caorle", "")).await;
    assert!(outcome.coordinate.is_none());
    assert_eq!(outcome.calls, 0);
}
