//! Session-lifetime dataset cache.
//!
//! Wraps [`load_dataset`] with process-wide memoization: the dataset is
//! loaded from disk once per session and every later interaction reuses the
//! cached [`DatasetAnalysis`]. The UI's reload key forces a fresh load;
//! there is no TTL because the aggregation itself never mutates the data.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use velo_core::error::{Result, VeloError};
use velo_data::analysis::{load_dataset, DatasetAnalysis};

/// Default number of decimal places for coordinate rounding.
pub const DEFAULT_COORD_PRECISION: u32 = 4;

// ── DatasetCache ──────────────────────────────────────────────────────────────

/// Memoized wrapper around the dataset load pipeline.
///
/// # Example
/// ```no_run
/// use std::path::PathBuf;
/// use velo_runtime::dataset_cache::DatasetCache;
///
/// let mut cache = DatasetCache::new(PathBuf::from("data"), 4);
/// let analysis = cache.get(false).expect("dataset loads");
/// println!("{} readings", analysis.dataset.len());
/// ```
pub struct DatasetCache {
    /// Where the CSV files live.
    data_path: PathBuf,
    /// Coordinate rounding precision forwarded to the load pipeline.
    precision: u32,
    /// The memoized analysis, populated on first successful load.
    cache: Option<DatasetAnalysis>,
    /// When the cache was populated.
    loaded_at: Option<Instant>,
    /// Human-readable description of the last load error.
    last_error: Option<String>,
}

impl DatasetCache {
    /// Create a cache for the given data path.
    pub fn new(data_path: PathBuf, precision: u32) -> Self {
        Self {
            data_path,
            precision,
            cache: None,
            loaded_at: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the dataset, loading it on the first call.
    ///
    /// When `force_reload` is `true` the cached value is discarded and the
    /// pipeline runs again. A failed load leaves any previous cache intact
    /// and returns the error; `last_error` remembers its message either
    /// way.
    pub fn get(&mut self, force_reload: bool) -> Result<&DatasetAnalysis> {
        if force_reload {
            self.invalidate();
        }

        if self.cache.is_none() {
            match load_dataset(&self.data_path, self.precision) {
                Ok(analysis) => {
                    tracing::debug!(
                        rows = analysis.dataset.len(),
                        "dataset cache populated"
                    );
                    self.cache = Some(analysis);
                    self.loaded_at = Some(Instant::now());
                    self.last_error = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dataset load failed");
                    self.last_error = Some(e.to_string());
                    return Err(e);
                }
            }
        }

        match self.cache {
            Some(ref analysis) => Ok(analysis),
            // Unreachable: the branch above either populated the cache or
            // returned the load error.
            None => Err(VeloError::Config("dataset cache empty".to_string())),
        }
    }

    /// Discard the cached dataset, forcing the next [`get`](Self::get) to
    /// reload from disk.
    pub fn invalidate(&mut self) {
        self.cache = None;
        self.loaded_at = None;
        tracing::debug!("dataset cache invalidated");
    }

    /// Age of the cached dataset, or `None` before the first load.
    pub fn age(&self) -> Option<Duration> {
        self.loaded_at.map(|ts| ts.elapsed())
    }

    /// `true` when a dataset is currently cached.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    /// Human-readable description of the last load error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
