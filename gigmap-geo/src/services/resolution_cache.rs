//! Coordinates from the previous run, keyed by event id
//!
//! Seeded from the previous raw dataset; the pipeline writes the new raw
//! dataset at the end of the run, which becomes the next run's cache.

use crate::error::StoreError;
use crate::models::{CachedRecord, Coordinate};
use gigmap_common::persist::read_json_records;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Cached state for one event occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub coordinate: Coordinate,
    /// Known-incorrect flag ids already honoured for this event
    pub cleared_flags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
    /// Cleared flags of events whose last resolution failed
    orphan_flags: HashMap<String, Vec<String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from previously written output records
    pub fn from_records(records: impl IntoIterator<Item = CachedRecord>) -> Self {
        let mut cache = Self::new();
        for record in records {
            match record.coordinates {
                Some(coordinate) => {
                    cache.entries.insert(
                        record.id,
                        CacheEntry {
                            coordinate,
                            cleared_flags: record.cleared_flags,
                        },
                    );
                }
                None if !record.cleared_flags.is_empty() => {
                    cache.orphan_flags.insert(record.id, record.cleared_flags);
                }
                None => {}
            }
        }
        cache
    }

    /// Load the previous run's output file
    ///
    /// Individual records that do not decode are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let records: Vec<CachedRecord> =
            read_json_records(path).map_err(|e| StoreError::unavailable(path, e))?;

        let cache = Self::from_records(records);
        info!(path = %path.display(), entries = cache.len(), "Loaded existing coordinates");
        Ok(cache)
    }

    /// Load the previous run's output, degrading to an empty cache
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("{}; every venue will be geocoded", e);
                Self::new()
            }
        }
    }

    pub fn get(&self, event_id: &str) -> Option<&Coordinate> {
        self.entries.get(event_id).map(|entry| &entry.coordinate)
    }

    /// Replace the coordinate for an event, keeping its cleared flags
    pub fn put(&mut self, event_id: &str, coordinate: Coordinate) {
        let cleared_flags = self.cleared_flags(event_id).to_vec();
        self.orphan_flags.remove(event_id);
        self.entries.insert(
            event_id.to_string(),
            CacheEntry {
                coordinate,
                cleared_flags,
            },
        );
    }

    /// Drop a coordinate known to be wrong, keeping its cleared flags
    pub fn invalidate(&mut self, event_id: &str) {
        if let Some(entry) = self.entries.remove(event_id) {
            if !entry.cleared_flags.is_empty() {
                self.orphan_flags
                    .insert(event_id.to_string(), entry.cleared_flags);
            }
        }
    }

    pub fn cleared_flags(&self, event_id: &str) -> &[String] {
        self.entries
            .get(event_id)
            .map(|entry| entry.cleared_flags.as_slice())
            .or_else(|| self.orphan_flags.get(event_id).map(Vec::as_slice))
            .unwrap_or(&[])
    }

    pub fn has_cleared(&self, event_id: &str, flag_id: &str) -> bool {
        self.cleared_flags(event_id).iter().any(|f| f == flag_id)
    }

    /// Record flags as honoured for an event
    pub fn clear_flags(&mut self, event_id: &str, flag_ids: &[String]) {
        let target = match self.entries.get_mut(event_id) {
            Some(entry) => &mut entry.cleared_flags,
            None => self.orphan_flags.entry(event_id.to_string()).or_default(),
        };
        for flag_id in flag_ids {
            if !target.contains(flag_id) {
                target.push(flag_id.clone());
            }
        }
    }

    /// Every event id with a cached coordinate
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceTier;
    use tempfile::TempDir;

    fn coordinate(lat: f64) -> Coordinate {
        Coordinate::new(lat, 13.0, "Somewhere", "bar", ConfidenceTier::ProviderFallbackSingle)
    }

    #[test]
    fn test_null_coordinates_are_not_cached() {
        let cache = ResolutionCache::from_records(vec![
            CachedRecord {
                id: "a".to_string(),
                coordinates: Some(coordinate(45.0)),
                cleared_flags: vec![],
            },
            CachedRecord {
                id: "b".to_string(),
                coordinates: None,
                cleared_flags: vec![],
            },
        ]);

        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_put_replaces_and_keeps_flags() {
        let mut cache = ResolutionCache::new();
        cache.put("a", coordinate(45.0));
        cache.clear_flags("a", &["flag-1".to_string()]);
        cache.put("a", coordinate(46.0));

        assert_eq!(cache.get("a").unwrap().lat(), 46.0);
        assert!(cache.has_cleared("a", "flag-1"));
    }

    #[test]
    fn test_clear_flags_without_entry() {
        let mut cache = ResolutionCache::new();
        cache.clear_flags("ghost", &["flag-1".to_string(), "flag-1".to_string()]);

        assert!(cache.get("ghost").is_none());
        assert_eq!(cache.cleared_flags("ghost"), ["flag-1".to_string()]);
    }

    #[test]
    fn test_invalidate_keeps_flags() {
        let mut cache = ResolutionCache::new();
        cache.put("a", coordinate(45.0));
        cache.clear_flags("a", &["flag-1".to_string()]);
        cache.invalidate("a");

        assert!(cache.get("a").is_none());
        assert!(cache.has_cleared("a", "flag-1"));
    }

    #[test]
    fn test_load_reads_legacy_map_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("past-concerts-map.json");
        std::fs::write(
            &path,
            r#"[
                {
                    "id": "p1",
                    "venue": "Verde Mare Club",
                    "location": "Caorle",
                    "date": "5 luglio 2025",
                    "coordinates": {
                        "lat": 45.6, "lng": 12.88,
                        "display_name": "Caorle", "type": "bar",
                        "confidence": "google_places", "place_id": "x", "rating": null
                    },
                    "popupText": "<strong>Verde Mare Club</strong>"
                }
            ]"#,
        )
        .unwrap();

        let cache = ResolutionCache::load(&path).unwrap();
        let cached = cache.get("p1").unwrap();
        assert_eq!(cached.confidence(), ConfidenceTier::ProviderPrimaryGeneric);
        assert_eq!(cached.lng(), 12.88);
    }

    #[test]
    fn test_bad_record_does_not_drop_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("past-concerts.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "good", "coordinates": {"lat": 45.8, "lng": 13.3, "display_name": "Bisboccia", "type": "pub", "confidence": "provider_fallback_single"}},
                {"id": "bad", "coordinates": {"lat": null, "lng": 13.3, "display_name": "Broken", "type": "pub", "confidence": "provider_fallback_single"}}
            ]"#,
        )
        .unwrap();

        let cache = ResolutionCache::load(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("good").unwrap().lat(), 45.8);
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn test_missing_or_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(ResolutionCache::load_or_empty(&dir.path().join("absent.json")).is_empty());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            ResolutionCache::load(&path),
            Err(StoreError::PersistenceUnavailable { .. })
        ));
        assert!(ResolutionCache::load_or_empty(&path).is_empty());
    }
}
