//! Shared building blocks for the market dashboard
//!
//! This crate provides:
//! - The `Record` / `RecordStore` abstraction over flat JSON array files
//! - The store error taxonomy and the explicit read fallback (`LoadOutcome`)
//! - Frequency tallies and percentage helpers used by every stats view
//! - Dashboard configuration and logging setup

pub mod config;
pub mod error;
pub mod logging;
pub mod stats;
pub mod store;

pub use config::{DashboardConfig, ExportConfig, RetentionConfig, WindowConfig};
pub use error::{LoadOutcome, StoreError};
pub use stats::{dominant, percentage, within_window, Ranked, Tally};
pub use store::{apply_save, InMemoryStore, JsonFileStore, Record, RecordStore, SaveReport};

// Re-export common crates for convenience
pub use chrono::{DateTime, Utc};
