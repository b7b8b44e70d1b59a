//! Human-curated venue corrections
//!
//! The override file holds three collections:
//! - `manual_venues.venues`: normalized venue name → coordinate
//! - `venue_aliases.aliases`: canonical venue name → alternate spellings
//! - `known_incorrect.flags`: venue-name patterns whose cached coordinates
//!   must be re-resolved once
//!
//! A pipeline run only reads this file. The maintenance commands
//! (`add_override`, `flag_incorrect`) edit it and write it back atomically.

use crate::error::StoreError;
use crate::models::{is_valid_position, ConfidenceTier, Coordinate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Place type recorded on override coordinates
pub const MANUAL_PLACE_TYPE: &str = "manual";

/// Lookup key for a venue: trimmed, lower-cased, inner whitespace collapsed
pub fn normalize_key(venue_name: &str) -> String {
    venue_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// On-disk layout of the override file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideFile {
    #[serde(default)]
    pub manual_venues: ManualVenues,
    #[serde(default)]
    pub venue_aliases: VenueAliases,
    #[serde(default)]
    pub known_incorrect: KnownIncorrect,
}

impl OverrideFile {
    /// Fresh file with explanatory comments, as created by the maintenance
    /// commands when none exists yet
    pub fn with_comments() -> Self {
        Self {
            manual_venues: ManualVenues {
                comment: "Manual coordinates for venues that are hard to geocode automatically"
                    .to_string(),
                venues: BTreeMap::new(),
            },
            venue_aliases: VenueAliases {
                comment: "Alternate spellings that must resolve to the same venue".to_string(),
                aliases: BTreeMap::new(),
            },
            known_incorrect: KnownIncorrect {
                comment: "Venues whose cached coordinates are wrong and must be re-resolved once"
                    .to_string(),
                flags: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualVenues {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub venues: BTreeMap<String, OverrideEntry>,
}

/// A human-supplied coordinate for one venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub added_date: String,
}

impl OverrideEntry {
    pub fn to_coordinate(&self) -> Coordinate {
        Coordinate::new(
            self.lat,
            self.lng,
            self.display_name.clone(),
            MANUAL_PLACE_TYPE,
            ConfidenceTier::Manual,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueAliases {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownIncorrect {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub flags: Vec<KnownIncorrectFlag>,
}

/// Marks cached coordinates of matching venues as wrong
///
/// Each flag forces one re-resolution per event: the re-resolved record
/// remembers the flag id and later runs trust the cache again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownIncorrectFlag {
    pub id: String,
    /// Case-insensitive venue-name substring
    pub pattern: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub flagged_date: String,
}

impl KnownIncorrectFlag {
    pub fn matches(&self, venue_name: &str) -> bool {
        let pattern = normalize_key(&self.pattern);
        !pattern.is_empty() && normalize_key(venue_name).contains(&pattern)
    }
}

/// Read-mostly view over the override file
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    file: OverrideFile,
    index: HashMap<String, OverrideEntry>,
}

impl OverrideStore {
    pub fn from_file(file: OverrideFile) -> Self {
        let index = build_index(&file);
        Self { file, index }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the override file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StoreError::unavailable(path, e))?;
        let file: OverrideFile =
            serde_json::from_str(&content).map_err(|e| StoreError::unavailable(path, e))?;

        let store = Self::from_file(file);
        info!(
            path = %path.display(),
            overrides = store.index.len(),
            aliases = store.file.venue_aliases.aliases.len(),
            flags = store.file.known_incorrect.flags.len(),
            "Loaded venue overrides"
        );
        Ok(store)
    }

    /// Load the override file, degrading to an empty store
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("{}; continuing without manual overrides", e);
                Self::empty()
            }
        }
    }

    /// Manual coordinate for a venue, matched case-insensitively
    pub fn lookup(&self, venue_name: &str) -> Option<Coordinate> {
        let key = normalize_key(venue_name);
        if key.is_empty() {
            return None;
        }
        self.index.get(&key).map(OverrideEntry::to_coordinate)
    }

    /// Every flag whose pattern matches the venue name
    pub fn known_incorrect(&self, venue_name: &str) -> Vec<&KnownIncorrectFlag> {
        self.file
            .known_incorrect
            .flags
            .iter()
            .filter(|flag| flag.matches(venue_name))
            .collect()
    }

    pub fn aliases(&self) -> &BTreeMap<String, Vec<String>> {
        &self.file.venue_aliases.aliases
    }

    pub fn file(&self) -> &OverrideFile {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert or replace the override for `venue_name`
    pub fn add_override(&mut self, venue_name: &str, entry: OverrideEntry) -> String {
        let key = normalize_key(venue_name);
        debug!(key = %key, "Recording manual override");
        self.file.manual_venues.venues.insert(key.clone(), entry);
        self.index = build_index(&self.file);
        key
    }

    /// Append a known-incorrect flag, returning its id
    pub fn flag_incorrect(&mut self, pattern: &str, note: &str, today: NaiveDate) -> String {
        let base = format!("{}-{}", slug(pattern), today.format("%Y%m%d"));
        let mut id = base.clone();
        let mut suffix = 2;
        while self.file.known_incorrect.flags.iter().any(|f| f.id == id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        self.file.known_incorrect.flags.push(KnownIncorrectFlag {
            id: id.clone(),
            pattern: pattern.trim().to_string(),
            note: note.to_string(),
            flagged_date: today.format("%Y-%m-%d").to_string(),
        });
        id
    }

    /// Write the override file atomically
    pub fn save(&self, path: &Path) -> gigmap_common::Result<()> {
        gigmap_common::persist::write_json_atomic(path, &self.file)
    }
}

fn build_index(file: &OverrideFile) -> HashMap<String, OverrideEntry> {
    file.manual_venues
        .venues
        .iter()
        .map(|(name, entry)| (normalize_key(name), entry.clone()))
        .collect()
}

fn slug(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "flag".to_string()
    } else {
        slug
    }
}

/// Reject positions outside the WGS84 range
pub fn validate_position(lat: f64, lng: f64) -> gigmap_common::Result<()> {
    if !is_valid_position(lat, lng) {
        return Err(gigmap_common::Error::InvalidInput(format!(
            "position out of range: {}, {}",
            lat, lng
        )));
    }
    Ok(())
}

/// Build an override entry the way the maintenance command records it
pub fn manual_entry(
    venue_name: &str,
    lat: f64,
    lng: f64,
    note: &str,
    region: &str,
    country: &str,
    today: NaiveDate,
) -> OverrideEntry {
    OverrideEntry {
        lat,
        lng,
        display_name: format!("{}, {}, {}", venue_name.trim(), region, country),
        notes: if note.trim().is_empty() {
            "Coordinates entered manually".to_string()
        } else {
            note.to_string()
        },
        added_date: today.format("%Y-%m-%d").to_string(),
    }
}

/// Maps search URL for finding a venue's coordinates by hand
pub fn search_url(venue_name: &str, locality: &str, region: &str) -> Option<String> {
    let query = [venue_name.trim(), locality.trim(), region]
        .iter()
        .filter(|term| !term.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let mut url = reqwest::Url::parse(MAPS_SEARCH_URL).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(&query);
    Some(url.to_string())
}
