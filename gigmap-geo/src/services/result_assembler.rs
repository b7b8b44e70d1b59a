//! Turns resolved events into the published dataset records

use crate::models::{ConfidenceTier, Coordinate, EventRecord, ListingEntry, MapRecord, ResolvedEvent};
use chrono::Datelike;
use gigmap_common::time::{display_date, month_abbrev_upper, parse_event_date};
use tracing::warn;

/// Raw dataset record for one event
pub fn assemble(
    record: &EventRecord,
    coordinate: Option<Coordinate>,
    cleared_flags: Vec<String>,
) -> ResolvedEvent {
    let confidence = coordinate
        .as_ref()
        .map(Coordinate::confidence)
        .unwrap_or(ConfidenceTier::Unresolved);

    ResolvedEvent {
        id: record.id.clone(),
        date: record.date.clone(),
        time: record.time.clone(),
        venue: record.venue_name.clone(),
        location: record.locality.clone(),
        city: record.city.clone(),
        address: record.address.clone(),
        notes: record.notes.clone(),
        coordinates: coordinate,
        confidence,
        cleared_flags,
    }
}

/// Map dataset record; `None` for events without a position
pub fn map_record(resolved: &ResolvedEvent) -> Option<MapRecord> {
    let coordinates = resolved.coordinates.clone()?;
    let date = display_date(&resolved.date);
    let popup_text = popup_text(&resolved.venue, &resolved.location, &date, &resolved.time);

    Some(MapRecord {
        id: resolved.id.clone(),
        venue: resolved.venue.clone(),
        location: resolved.location.clone(),
        city: resolved.city.clone(),
        date,
        time: resolved.time.clone(),
        coordinates,
        popup_text,
    })
}

/// `<strong>venue</strong><br>locality<br>date - time`, locality line
/// omitted when empty
pub fn popup_text(venue: &str, locality: &str, date: &str, time: &str) -> String {
    let mut popup = format!("<strong>{}</strong><br>", escape_html(venue));
    if !locality.trim().is_empty() {
        popup.push_str(&escape_html(locality));
        popup.push_str("<br>");
    }
    popup.push_str(&format!("{} - {}", escape_html(date), escape_html(time)));
    popup
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Upcoming-listing entry; `None` when the date cannot be read
pub fn listing_entry(record: &EventRecord) -> Option<ListingEntry> {
    let Some(date) = parse_event_date(&record.date) else {
        warn!(id = %record.id, date = %record.date, "Skipping listing entry with unparseable date");
        return None;
    };

    Some(ListingEntry {
        day: date.day(),
        month: month_abbrev_upper(date),
        year: date.year(),
        full_date: record.date.clone(),
        time: record.time.clone(),
        venue: record.venue_name.clone(),
        city: record.city.clone(),
        address: record.address.clone(),
        notes: record.notes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EventRecord {
        EventRecord::new("ev-1", "2025-07-05", "Bisboccia")
            .with_locality("Cervignano")
            .with_city("Udine")
    }

    fn coordinate() -> Coordinate {
        Coordinate::new(45.8162, 13.3549, "Bisboccia", "pub", ConfidenceTier::ProviderFallbackSingle)
    }

    #[test]
    fn test_unresolved_event_is_kept_in_raw_dataset() {
        let resolved = assemble(&record(), None, vec![]);

        assert_eq!(resolved.confidence, ConfidenceTier::Unresolved);
        assert!(resolved.coordinates.is_none());
        assert!(map_record(&resolved).is_none());

        let json = serde_json::to_value(&resolved).unwrap();
        assert!(json["coordinates"].is_null());
        assert!(json.get("cleared_flags").is_none());
    }

    #[test]
    fn test_map_record_formats_date_and_popup() {
        let resolved = assemble(&record(), Some(coordinate()), vec![]);
        let map = map_record(&resolved).unwrap();

        assert_eq!(map.date, "5 luglio 2025");
        assert_eq!(
            map.popup_text,
            "<strong>Bisboccia</strong><br>Cervignano<br>5 luglio 2025 - 21:00"
        );
        assert_eq!(map.coordinates.confidence(), ConfidenceTier::ProviderFallbackSingle);
    }

    #[test]
    fn test_popup_without_locality_and_escaped() {
        assert_eq!(
            popup_text("Bar <Sport> & Co", "", "1 maggio 2024", "22:00"),
            "<strong>Bar &lt;Sport&gt; &amp; Co</strong><br>1 maggio 2024 - 22:00"
        );
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        let mut event = record();
        event.date = "sometime in June".to_string();
        let map = map_record(&assemble(&event, Some(coordinate()), vec![])).unwrap();

        assert_eq!(map.date, "sometime in June");
        assert!(listing_entry(&event).is_none());
    }

    #[test]
    fn test_listing_entry() {
        let event = EventRecord::new("ev-2", "2025-10-03T21:30:00.000+02:00", "Astro Club")
            .with_city("Fontanafredda")
            .with_time("21:30");
        let entry = listing_entry(&event).unwrap();

        assert_eq!(entry.day, 3);
        assert_eq!(entry.month, "OTT");
        assert_eq!(entry.year, 2025);
        assert_eq!(entry.full_date, "2025-10-03T21:30:00.000+02:00");
        assert_eq!(entry.venue, "Astro Club");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["fullDate"], "2025-10-03T21:30:00.000+02:00");
    }
}
