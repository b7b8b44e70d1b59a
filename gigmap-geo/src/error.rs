//! Error types for gigmap-geo
//!
//! Per-provider and per-store failures are contained: the pipeline logs them
//! and moves on. Only the event source and the final output write are fatal,
//! and those surface as `gigmap_common::Error`.

use std::path::PathBuf;
use thiserror::Error;

/// Geocoding provider errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// No credential for this provider; it is skipped
    #[error("{provider} not configured: {reason}")]
    ConfigurationMissing {
        provider: &'static str,
        reason: String,
    },

    /// Network failure or non-success response
    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable {
        provider: &'static str,
        reason: String,
    },

    /// Successful response without a usable candidate
    #[error("{provider} returned no usable candidates")]
    NoCandidates { provider: &'static str },
}

impl GeocodeError {
    pub fn provider(&self) -> &'static str {
        match self {
            GeocodeError::ConfigurationMissing { provider, .. }
            | GeocodeError::ProviderUnavailable { provider, .. }
            | GeocodeError::NoCandidates { provider } => provider,
        }
    }
}

/// Override and cache store errors
///
/// Loaders return these; callers degrade to an empty store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence unavailable at {}: {reason}", .path.display())]
    PersistenceUnavailable { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn unavailable(path: &std::path::Path, reason: impl ToString) -> Self {
        StoreError::PersistenceUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
