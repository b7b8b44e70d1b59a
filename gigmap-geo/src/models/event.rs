//! Event rows supplied by the record store

use serde::{Deserialize, Serialize};

/// Start time shown when the record store leaves it blank
pub const DEFAULT_EVENT_TIME: &str = "21:00";

fn default_time() -> String {
    DEFAULT_EVENT_TIME.to_string()
}

/// One event occurrence as exported by the record store
///
/// Accepts both English keys and the Italian column names used by the
/// concert database (`data`, `ora`, `locale`, `luogo`, `citta`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable identifier from the record store
    pub id: String,

    /// ISO date, optionally with a time component
    #[serde(alias = "data", default)]
    pub date: String,

    #[serde(alias = "ora", default = "default_time")]
    pub time: String,

    #[serde(rename = "venue", alias = "locale", default)]
    pub venue_name: String,

    /// Sub-city place name (small town, neighbourhood)
    #[serde(rename = "location", alias = "luogo", default)]
    pub locality: String,

    #[serde(alias = "citta", alias = "città", default)]
    pub city: String,

    #[serde(alias = "indirizzo", default)]
    pub address: String,

    #[serde(alias = "note", default)]
    pub notes: String,
}

impl EventRecord {
    pub fn new(id: impl Into<String>, date: impl Into<String>, venue_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            time: default_time(),
            venue_name: venue_name.into(),
            locality: String::new(),
            city: String::new(),
            address: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = locality.into();
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Apply record-store defaults to blank fields
    pub fn normalized(mut self) -> Self {
        if self.time.trim().is_empty() {
            self.time = default_time();
        }
        self
    }
}
