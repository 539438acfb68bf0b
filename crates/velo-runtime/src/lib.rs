//! Runtime layer for velo-monitor.
//!
//! Owns the session-lifetime dataset cache that sits between the data
//! ingestion pipeline and the UI event loop.

pub mod dataset_cache;

pub use velo_core as core;
pub use velo_data as data;
