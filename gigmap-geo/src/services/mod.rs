//! Stores, provider clients and assembly services

pub mod alias_resolver;
pub mod event_source;
pub mod nominatim_client;
pub mod override_store;
pub mod places_client;
pub mod provider_chain;
pub mod rate_limiter;
pub mod resolution_cache;
pub mod result_assembler;

pub use alias_resolver::AliasResolver;
pub use event_source::{EventQuery, EventSource, JsonFileSource, SortOrder};
pub use nominatim_client::NominatimClient;
pub use override_store::OverrideStore;
pub use places_client::PlacesClient;
pub use provider_chain::{AttemptFailure, ChainOutcome, ProviderChain, QueryBuilder, QueryStrategy, VenueTerms};
pub use rate_limiter::RateLimiter;
pub use resolution_cache::ResolutionCache;
