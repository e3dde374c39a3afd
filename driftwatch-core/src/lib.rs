//! # driftwatch-core
//!
//! Core library for driftwatch - workflow drift analysis for AI-assisted
//! commit history.
//!
//! This library provides:
//! - Domain types for projects, classified commits, and recommendations
//! - Metric windows, phase detection, and pattern detectors
//! - The recommendation engine and its SQLite storage layer
//! - Import of classified commits
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Input:** Classified commits imported into SQLite (immutable)
//! - **Derived:** Metric windows and phase, recomputed on every run
//! - **Persisted:** Recommendations with a lifecycle (active, acknowledged,
//!   dismissed, resolved)
//!
//! ## Example
//!
//! ```rust,no_run
//! use driftwatch_core::{analytics, Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! // Analyze a project
//! let engine = analytics::create_engine(&config).expect("invalid detector config");
//! let result = engine.analyze_project("my-project", &db).expect("analysis failed");
//! println!("{} new recommendations", result.created);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, RecommendationFilter};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod types;
