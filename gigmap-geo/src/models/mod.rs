//! Data model for events, coordinates and the generated datasets

pub mod coordinate;
pub mod dataset;
pub mod event;

pub use coordinate::{is_valid_position, ConfidenceTier, Coordinate};
pub use dataset::{CachedRecord, ListingEntry, MapRecord, ResolvedEvent};
pub use event::{EventRecord, DEFAULT_EVENT_TIME};
