//! # gigmap common library
//!
//! Shared code for the gigmap tools:
//! - Error and result types
//! - Bootstrap configuration (TOML) and config file resolution
//! - Atomic file persistence helpers
//! - Locale-aware date helpers

pub mod config;
pub mod error;
pub mod persist;
pub mod time;

pub use error::{Error, Result};
