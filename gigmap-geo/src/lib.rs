//! gigmap-geo: venue coordinate resolution for the concert calendar
//!
//! Resolves each past event's venue to map coordinates through manual
//! overrides, the previous run's results and two external geocoders, then
//! publishes the raw and map datasets. Also builds the upcoming-events
//! listing.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod workflow;

pub use error::{GeocodeError, StoreError};
pub use types::{Candidate, GeocodeProvider};
