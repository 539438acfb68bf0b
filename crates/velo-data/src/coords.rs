//! Canonical station coordinates.
//!
//! Builds a per-station coordinate lookup from the raw readings: rounds
//! coordinates to a fixed precision so near-equal duplicates merge, detects
//! a dominant placeholder pair, and keeps the first remaining valid pair
//! per station in the dataset's defined sort order.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use velo_core::models::Reading;

/// A rounded coordinate pair appearing in more than this share of all
/// located rows is treated as a placeholder, not a real location.
pub const DUMMY_SHARE_THRESHOLD: f64 = 0.30;

/// Per-station canonical coordinate lookup.
#[derive(Debug, Clone)]
pub struct CoordinateIndex {
    /// Station name → rounded (lat, lon). BTreeMap keeps iteration in
    /// station order for deterministic reporting.
    canonical: BTreeMap<String, (f64, f64)>,
    /// The detected placeholder pair, if any.
    dummy: Option<(f64, f64)>,
    /// Number of readings that carried a valid coordinate pair.
    located_rows: usize,
}

impl CoordinateIndex {
    /// Build the index from readings already in defined sort order.
    ///
    /// `precision` is the number of decimal places kept when rounding; at
    /// 4 decimals two sensors a few metres apart collapse to one pair.
    pub fn build(readings: &[Reading], precision: u32) -> Self {
        let factor = 10_f64.powi(precision as i32);

        // First pass: count every rounded pair so a dominant placeholder
        // can be recognised before any canonical assignment happens.
        let mut pair_counts: HashMap<(i64, i64), usize> = HashMap::new();
        let mut located_rows = 0usize;

        for reading in readings {
            if let Some(key) = rounded_key(reading, factor) {
                located_rows += 1;
                *pair_counts.entry(key).or_insert(0) += 1;
            }
        }

        // A pair only counts as a placeholder when other pairs exist; a
        // single-station dataset legitimately has a 100 % share.
        let dummy_key = if pair_counts.len() > 1 {
            pair_counts
                .iter()
                .max_by_key(|&(_, &count)| count)
                .and_then(|(&key, &count)| {
                    let share = count as f64 / located_rows as f64;
                    if share > DUMMY_SHARE_THRESHOLD {
                        Some(key)
                    } else {
                        None
                    }
                })
        } else {
            None
        };

        if let Some(key) = dummy_key {
            let (lat, lon) = key_to_pair(key, factor);
            debug!("Detected dummy coordinate pair ({lat}, {lon})");
        }

        // Second pass: first valid, non-placeholder pair per station wins.
        let mut canonical: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for reading in readings {
            let Some(key) = rounded_key(reading, factor) else {
                continue;
            };
            if Some(key) == dummy_key {
                continue;
            }
            canonical
                .entry(reading.station.clone())
                .or_insert_with(|| key_to_pair(key, factor));
        }

        Self {
            canonical,
            dummy: dummy_key.map(|key| key_to_pair(key, factor)),
            located_rows,
        }
    }

    /// The canonical coordinate for `station`, if one exists.
    pub fn lookup(&self, station: &str) -> Option<(f64, f64)> {
        self.canonical.get(station).copied()
    }

    /// The detected placeholder pair, if any.
    pub fn dummy_pair(&self) -> Option<(f64, f64)> {
        self.dummy
    }

    /// Number of readings that carried a valid coordinate pair.
    pub fn located_rows(&self) -> usize {
        self.located_rows
    }

    /// Number of stations with a canonical coordinate.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Bounding box over all canonical coordinates as
    /// `((min_lat, min_lon), (max_lat, max_lon))`, or `None` when empty.
    /// The map view uses this to scale its viewport.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut iter = self.canonical.values();
        let &(first_lat, first_lon) = iter.next()?;
        let mut min = (first_lat, first_lon);
        let mut max = (first_lat, first_lon);
        for &(lat, lon) in iter {
            min.0 = min.0.min(lat);
            min.1 = min.1.min(lon);
            max.0 = max.0.max(lat);
            max.1 = max.1.max(lon);
        }
        Some((min, max))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Integer key for a reading's rounded coordinate pair; `None` when the
/// pair is missing, non-finite or outside the valid degree range.
fn rounded_key(reading: &Reading, factor: f64) -> Option<(i64, i64)> {
    let (lat, lon) = (reading.lat?, reading.lon?);
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return None;
    }
    Some(((lat * factor).round() as i64, (lon * factor).round() as i64))
}

fn key_to_pair(key: (i64, i64), factor: f64) -> (f64, f64) {
    (key.0 as f64 / factor, key.1 as f64 / factor)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
