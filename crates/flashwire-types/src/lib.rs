//! # Flashwire Types
//!
//! Shared types for the Flashwire enrichment pipeline.
//! This crate provides the boundary DTOs passed between pipeline stages and
//! persisted at the storage edge, plus the shared error kinds. Keeping them
//! here breaks circular dependencies between the pipeline, the store adapter
//! and the HTTP layer.
//!
//! ## Organization
//!
//! - `entities`: named-entity buckets and extraction metadata
//! - `errors`: error kinds shared across crates
//! - `geo`: resolved country records
//! - `models`: feed entries, working extraction records, processing results

pub mod entities;
pub mod errors;
pub mod geo;
pub mod models;

pub use entities::{BundleMeta, EntityBundle, EntityLabel, EntityMention};
pub use errors::{EnrichError, EnrichResult};
pub use geo::GeoEntity;
pub use models::{
    ArticleStatus, BatchStatus, BatchSummary, ExtractResult, FeedEntry, ProcessingResult,
};
