//! Database layer for driftwatch
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - The [`RecommendationStore`](crate::analytics::RecommendationStore) implementation used by the engine

pub mod repo;
pub mod schema;

pub use repo::{AnalysisRun, Database, RecommendationFilter};
