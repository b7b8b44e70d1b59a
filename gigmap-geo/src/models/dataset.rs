//! Records written to the generated datasets

use super::{ConfidenceTier, Coordinate};
use serde::{Deserialize, Serialize};

/// Raw dataset record: every event, resolved or not
///
/// The raw dataset doubles as the resolution cache for the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub id: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub location: String,
    pub city: String,
    pub address: String,
    pub notes: String,
    /// `null` when every resolution stage failed
    pub coordinates: Option<Coordinate>,
    pub confidence: ConfidenceTier,
    /// Known-incorrect flags already honoured for this event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleared_flags: Vec<String>,
}

/// Map dataset record, only for events with a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    pub id: String,
    pub venue: String,
    pub location: String,
    pub city: String,
    /// Locale-formatted date
    pub date: String,
    pub time: String,
    pub coordinates: Coordinate,
    #[serde(rename = "popupText")]
    pub popup_text: String,
}

/// Upcoming-events listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub day: u32,
    /// Abbreviated upper-case month, e.g. `LUG`
    pub month: String,
    pub year: i32,
    #[serde(rename = "fullDate")]
    pub full_date: String,
    pub time: String,
    pub venue: String,
    pub city: String,
    pub address: String,
    pub notes: String,
}

/// The subset of a previous output record the resolution cache reads
///
/// Matches both the raw dataset and older map files.
#[derive(Debug, Clone, Deserialize)]
pub struct CachedRecord {
    pub id: String,
    #[serde(default)]
    pub coordinates: Option<Coordinate>,
    #[serde(default)]
    pub cleared_flags: Vec<String>,
}
