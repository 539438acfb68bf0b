//! Top-level dataset load pipeline for velo-monitor.
//!
//! Orchestrates CSV loading, catalog construction and coordinate indexing,
//! returning a [`DatasetAnalysis`] ready for the runtime cache and the UI
//! layer.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::info;
use velo_core::error::Result;

use crate::coords::CoordinateIndex;
use crate::dataset::Dataset;
use crate::reader::load_readings;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the loaded dataset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this load completed.
    pub generated_at: String,
    /// Number of CSV files read.
    pub files_loaded: usize,
    /// Number of readings kept.
    pub rows_loaded: usize,
    /// Number of rows dropped as unparseable.
    pub rows_skipped: usize,
    /// Number of stations that received a canonical coordinate.
    pub stations_located: usize,
    /// The placeholder coordinate pair, when one was detected.
    pub dummy_coordinate: Option<(f64, f64)>,
    /// Wall-clock seconds spent reading the CSV files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent building catalog and coordinate index.
    pub index_time_seconds: f64,
}

/// The complete output of [`load_dataset`]: everything the session needs to
/// answer filter interactions without touching the disk again.
#[derive(Debug, Clone)]
pub struct DatasetAnalysis {
    /// The dataset catalog.
    pub dataset: Dataset,
    /// Canonical station coordinates.
    pub coords: CoordinateIndex,
    /// Metadata about this load.
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full load pipeline.
///
/// 1. Discover and parse CSV files under `data_path`.
/// 2. Build the [`Dataset`] catalog from the sorted readings.
/// 3. Build the [`CoordinateIndex`] with `precision` decimal places.
///
/// Errors out on a missing path, an empty data directory or a file without
/// the required columns; these halt the session with a user-visible message
/// rather than producing a silently empty dashboard.
pub fn load_dataset(data_path: &Path, precision: u32) -> Result<DatasetAnalysis> {
    let load_start = Instant::now();
    let loaded = load_readings(data_path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let index_start = Instant::now();
    let coords = CoordinateIndex::build(&loaded.readings, precision);
    let dataset = Dataset::new(
        loaded.readings,
        loaded.has_normalized,
        loaded.has_precipitation,
    );
    let index_time = index_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        files_loaded: loaded.files_loaded,
        rows_loaded: dataset.len(),
        rows_skipped: loaded.rows_skipped,
        stations_located: coords.len(),
        dummy_coordinate: coords.dummy_pair(),
        load_time_seconds: load_time,
        index_time_seconds: index_time,
    };

    info!(
        rows = metadata.rows_loaded,
        skipped = metadata.rows_skipped,
        stations = dataset.stations().len(),
        located = metadata.stations_located,
        "dataset loaded"
    );

    Ok(DatasetAnalysis {
        dataset,
        coords,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
