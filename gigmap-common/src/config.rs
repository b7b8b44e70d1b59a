//! Bootstrap configuration and config file resolution
//!
//! Configuration file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `GIGMAP_CONFIG` environment variable
//! 3. `<user config dir>/gigmap/config.toml` if it exists
//! 4. Compiled defaults (no file)
//!
//! A missing file never terminates the program: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GIGMAP_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Directory holding the override file and every generated dataset
    pub data_dir: PathBuf,

    /// Exported event rows (defaults to `<data_dir>/events.json`)
    pub events_file: Option<PathBuf>,

    /// Places search API key (the `GOOGLE_PLACES_API_KEY` environment
    /// variable takes priority)
    pub places_api_key: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Query construction and provider settings
    pub geocoding: GeocodingConfig,

    /// Inter-request delays
    pub pacing: PacingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            events_file: None,
            places_api_key: None,
            logging: LoggingConfig::default(),
            geocoding: GeocodingConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl TomlConfig {
    pub fn events_path(&self) -> PathBuf {
        self.events_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("events.json"))
    }

    /// Human-curated overrides, aliases and known-incorrect flags
    pub fn overrides_path(&self) -> PathBuf {
        self.data_dir.join("manual-coordinates.json")
    }

    /// Every past event with its (possibly null) coordinates; also the
    /// resolution cache for the next run
    pub fn raw_dataset_path(&self) -> PathBuf {
        self.data_dir.join("past-concerts.json")
    }

    /// Past events with coordinates, shaped for the map widget
    pub fn map_dataset_path(&self) -> PathBuf {
        self.data_dir.join("past-concerts-map.json")
    }

    /// Upcoming events listing
    pub fn listing_path(&self) -> PathBuf {
        self.data_dir.join("concerts.json")
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, console only if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Geocoding query construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Country term appended to every query
    pub country: String,

    /// ISO country code passed as a provider filter/region hint
    pub country_code: String,

    /// Result language hint for the places provider
    pub language: String,

    /// Region qualifier used for most localities
    pub primary_region: String,

    /// Region qualifier used for coastal localities
    pub coastal_region: String,

    /// Localities often confused with inland namesakes; they get
    /// locality-first queries and the coastal region
    pub coastal_localities: Vec<String>,

    /// Further localities that belong to the coastal region but keep the
    /// default term order
    pub coastal_region_extra: Vec<String>,

    /// Generic venue-type words prefixed to the venue name by the keyword
    /// fallback strategy
    pub venue_keywords: String,

    /// Client identification sent to the open geocoder
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum candidates requested from the open geocoder
    pub fallback_result_limit: u32,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            country: "Italia".to_string(),
            country_code: "it".to_string(),
            language: "it".to_string(),
            primary_region: "Friuli-Venezia Giulia".to_string(),
            coastal_region: "Veneto".to_string(),
            coastal_localities: ["Caorle", "Jesolo", "Bibione", "Lignano"]
                .into_iter()
                .map(String::from)
                .collect(),
            coastal_region_extra: ["Venezia", "Padova"]
                .into_iter()
                .map(String::from)
                .collect(),
            venue_keywords: "bar pub ristorante locale".to_string(),
            user_agent: format!("gigmap/{} (concert map)", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            fallback_result_limit: 3,
        }
    }
}

/// Inter-request delays in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum spacing between places provider requests
    pub primary_interval_ms: u64,

    /// Minimum spacing between open geocoder requests (its usage policy
    /// allows one per second)
    pub fallback_interval_ms: u64,

    /// Pause between consecutive fallback strategies
    pub strategy_delay_ms: u64,

    /// Pause after each event that needed a network lookup
    pub event_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            primary_interval_ms: 200,
            fallback_interval_ms: 1200,
            strategy_delay_ms: 500,
            event_delay_ms: 1200,
        }
    }
}

impl PacingConfig {
    /// No delays at all; for tests and offline runs
    pub fn immediate() -> Self {
        Self {
            primary_interval_ms: 0,
            fallback_interval_ms: 0,
            strategy_delay_ms: 0,
            event_delay_ms: 0,
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfigDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserConfigDir(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

/// Resolves which config file to read
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    pub fn resolve(&self) -> ConfigSource {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        // Priority 3: user config directory, only when the file exists
        if let Some(path) = default_config_path() {
            if path.exists() {
                return ConfigSource::UserConfigDir(path);
            }
        }

        ConfigSource::Defaults
    }
}

/// `<user config dir>/gigmap/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gigmap").join("config.toml"))
}

/// Load configuration from the resolved source
///
/// Missing file → warning + defaults. A file that exists but does not parse
/// is an error: silently ignoring a typo would drop the API key or paths.
pub fn load_config(source: &ConfigSource) -> Result<TomlConfig> {
    let Some(path) = source.path() else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write configuration atomically (temp + rename)
///
/// The file may hold an API key, so on Unix it is restricted to the owner.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    crate::persist::write_atomic(path, content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
