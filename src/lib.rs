//! ExpBoard - opportunity search
//!
//! Matches job postings ("candidates") against a free-text query, an optional
//! semantic ranking oracle, a location with radius, and facet filters. Places
//! are geocoded through a cached, coalescing resolver; results are paginated.

pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod model;
pub mod outcome;
pub mod search;
pub mod semantic;
pub mod storage;

pub use error::{ExpboardError, Result};
