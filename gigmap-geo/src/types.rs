//! Provider seam shared by the geocoding clients
//!
//! Both external geocoders implement `GeocodeProvider`; the provider chain
//! applies the per-provider candidate selection rules on top.

use crate::error::GeocodeError;

/// One ranked result from a provider, normalized across providers
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub lat: f64,
    pub lng: f64,
    /// Formatted address or display name
    pub display_name: String,
    /// Category tags, most specific first (places types, or the open
    /// geocoder's single `type`)
    pub categories: Vec<String>,
    /// Coarse class tag (open geocoder only, e.g. `amenity`)
    pub class: Option<String>,
    /// Opaque provider place identifier
    pub place_id: Option<String>,
    pub rating: Option<f64>,
}

impl Candidate {
    pub fn new(lat: f64, lng: f64, display_name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            display_name: display_name.into(),
            categories: Vec::new(),
            class: None,
            place_id: None,
            rating: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

/// External geocoder
///
/// Implementations perform exactly one outbound request per `search` call.
/// Pacing is the caller's job.
#[async_trait::async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Provider name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Free-text search, candidates in provider rank order
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError>;
}
