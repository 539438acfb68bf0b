//! Per-station intensity aggregation.
//!
//! For each selected station, sums the chosen metric twice: once over the
//! baseline filter (months + stations, precipitation ignored) and once with
//! the precipitation threshold applied. Intensity is the subset share of
//! the baseline total, clipped to `[0, 1]`.

use std::collections::BTreeMap;

use velo_core::error::{Result, VeloError};
use velo_core::models::{FilterSelection, StationSummary, UnmappedStation};

use crate::coords::CoordinateIndex;
use crate::dataset::Dataset;

// ── SummaryTable ──────────────────────────────────────────────────────────────

/// The aggregation result for one filter selection.
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    /// One row per selected station with a canonical coordinate, ascending
    /// by station name.
    pub rows: Vec<StationSummary>,
    /// Selected stations without a usable location, same ordering. Shown as
    /// a data-quality list, never silently dropped.
    pub unmapped: Vec<UnmappedStation>,
    /// Sum of `subset_sum` over all stations (mapped and unmapped).
    pub subset_total: f64,
    /// Sum of `total_sum` over all stations (mapped and unmapped).
    pub grand_total: f64,
}

impl SummaryTable {
    /// `true` when no reading matched the baseline filter at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.unmapped.is_empty()
    }

    /// Number of stations represented (mapped + unmapped).
    pub fn station_count(&self) -> usize {
        self.rows.len() + self.unmapped.len()
    }
}

// ── StationIntensityAggregator ────────────────────────────────────────────────

/// Stateless helper computing [`SummaryTable`]s from a dataset and filter.
pub struct StationIntensityAggregator;

impl StationIntensityAggregator {
    /// Run the aggregation for `selection`.
    ///
    /// Stations appear in the result when at least one reading matches the
    /// baseline filter; a station whose readings all fail the precipitation
    /// threshold keeps its baseline total and gets `subset_sum = 0`.
    ///
    /// An empty station selection aborts with
    /// [`VeloError::NoStationsSelected`] instead of aggregating over
    /// everything. An empty result (no reading matched) is not an error;
    /// callers check [`SummaryTable::is_empty`].
    pub fn summarize(
        dataset: &Dataset,
        coords: &CoordinateIndex,
        selection: &FilterSelection,
    ) -> Result<SummaryTable> {
        if selection.stations.is_empty() {
            return Err(VeloError::NoStationsSelected);
        }

        // Group both sums in one pass. BTreeMap keys give the ascending
        // station ordering of the final table for free.
        let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for reading in dataset.readings() {
            if !selection.matches_baseline(reading) {
                continue;
            }
            let value = dataset.metric_value(reading, selection.metric);
            let entry = totals.entry(reading.station.clone()).or_insert((0.0, 0.0));
            entry.0 += value;
            if reading.precipitation_mm <= selection.max_precipitation_mm {
                entry.1 += value;
            }
        }

        let mut table = SummaryTable::default();

        for (station, (total_sum, subset_sum)) in totals {
            let intensity = intensity(subset_sum, total_sum);
            table.subset_total += subset_sum;
            table.grand_total += total_sum;

            match coords.lookup(&station) {
                Some((lat, lon)) => table.rows.push(StationSummary {
                    station,
                    lat,
                    lon,
                    subset_sum,
                    total_sum,
                    intensity,
                }),
                None => table.unmapped.push(UnmappedStation {
                    station,
                    subset_sum,
                    total_sum,
                    intensity,
                }),
            }
        }

        Ok(table)
    }
}

/// `clip(subset / total, 0, 1)`, defined as `0.0` when the total is not
/// strictly positive.
fn intensity(subset_sum: f64, total_sum: f64) -> f64 {
    if total_sum > 0.0 {
        (subset_sum / total_sum).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use velo_core::models::{CountMetric, Reading};

    fn make_reading(station: &str, month: &str, count: f64, rain: f64) -> Reading {
        Reading {
            station: station.to_string(),
            lat: Some(51.9616),
            lon: Some(7.6284),
            count,
            normalized_count: None,
            precipitation_mm: rain,
            month: month.to_string(),
            date: None,
        }
    }

    fn selection(max_rain: f64, stations: &[&str], months: &[&str]) -> FilterSelection {
        FilterSelection {
            max_precipitation_mm: max_rain,
            months: months.iter().map(|m| m.to_string()).collect(),
            stations: stations.iter().map(|s| s.to_string()).collect(),
            metric: CountMetric::Raw,
        }
    }

    /// All test readings share one city-centre pair; a single distinct pair
    /// is never flagged as a placeholder, so every station stays mappable.
    fn dataset_and_coords(readings: Vec<Reading>) -> (Dataset, CoordinateIndex) {
        let coords = CoordinateIndex::build(&readings, 4);
        (Dataset::new(readings, false, true), coords)
    }

    // ── Worked example from the product definition ────────────────────────────

    #[test]
    fn test_worked_example() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 10.0, 0.0),
            make_reading("A", "2024-01", 5.0, 2.0),
            make_reading("B", "2024-01", 7.0, 0.0),
        ]);
        let sel = selection(0.0, &["A", "B"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert_eq!(table.rows.len(), 2);

        let a = &table.rows[0];
        assert_eq!(a.station, "A");
        assert!((a.total_sum - 15.0).abs() < f64::EPSILON);
        assert!((a.subset_sum - 10.0).abs() < f64::EPSILON);
        assert!((a.intensity - 10.0 / 15.0).abs() < 1e-9);

        let b = &table.rows[1];
        assert_eq!(b.station, "B");
        assert!((b.total_sum - 7.0).abs() < f64::EPSILON);
        assert!((b.subset_sum - 7.0).abs() < f64::EPSILON);
        assert!((b.intensity - 1.0).abs() < 1e-9);
    }

    // ── Intensity bounds ──────────────────────────────────────────────────────

    #[test]
    fn test_intensity_always_in_unit_interval() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 10.0, 0.0),
            make_reading("A", "2024-01", 990.0, 50.0),
            make_reading("B", "2024-01", 1.0, 50.0),
            make_reading("C", "2024-01", 0.0, 0.0),
        ]);

        for threshold in [0.0, 10.0, 25.0, 50.0, 100.0] {
            let sel = selection(threshold, &["A", "B", "C"], &["2024-01"]);
            let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
            for row in &table.rows {
                assert!(
                    (0.0..=1.0).contains(&row.intensity),
                    "intensity {} out of range at threshold {}",
                    row.intensity,
                    threshold
                );
            }
        }
    }

    #[test]
    fn test_inclusive_threshold_gives_intensity_one() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 10.0, 3.0),
            make_reading("A", "2024-02", 20.0, 80.0),
            make_reading("B", "2024-01", 5.0, 12.0),
        ]);
        // Threshold at the dataset maximum: the subset filter is as
        // inclusive as the baseline.
        let sel = selection(80.0, &["A", "B"], &["2024-01", "2024-02"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        for row in &table.rows {
            assert!(row.total_sum > 0.0);
            assert!((row.intensity - 1.0).abs() < 1e-9, "station {}", row.station);
        }
    }

    #[test]
    fn test_zero_total_yields_zero_intensity() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 0.0, 0.0),
            make_reading("A", "2024-01", 0.0, 5.0),
        ]);
        let sel = selection(10.0, &["A"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].intensity, 0.0);
    }

    #[test]
    fn test_station_with_no_subset_rows_defaults_to_zero() {
        let (ds, coords) = dataset_and_coords(vec![make_reading("A", "2024-01", 10.0, 30.0)]);
        let sel = selection(5.0, &["A"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        let a = &table.rows[0];
        assert_eq!(a.subset_sum, 0.0);
        assert!((a.total_sum - 10.0).abs() < f64::EPSILON);
        assert_eq!(a.intensity, 0.0);
    }

    // ── Sum conservation ──────────────────────────────────────────────────────

    #[test]
    fn test_subset_total_matches_filtered_metric_sum() {
        let readings = vec![
            make_reading("A", "2024-01", 10.0, 0.0),
            make_reading("A", "2024-02", 20.0, 9.0),
            make_reading("B", "2024-01", 7.0, 3.0),
            make_reading("B", "2024-02", 13.0, 30.0),
            make_reading("C", "2024-01", 100.0, 0.0), // not selected
        ];
        let (ds, coords) = dataset_and_coords(readings.clone());
        let sel = selection(9.0, &["A", "B"], &["2024-01", "2024-02"]);

        let expected: f64 = readings
            .iter()
            .filter(|r| sel.matches_subset(r))
            .map(|r| r.count)
            .sum();

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert!((table.subset_total - expected).abs() < 1e-9);

        let row_sum: f64 = table.rows.iter().map(|r| r.subset_sum).sum::<f64>()
            + table.unmapped.iter().map(|r| r.subset_sum).sum::<f64>();
        assert!((row_sum - expected).abs() < 1e-9);
    }

    // ── Filter semantics ──────────────────────────────────────────────────────

    #[test]
    fn test_baseline_ignores_precipitation() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 10.0, 0.0),
            make_reading("A", "2024-01", 90.0, 99.0),
        ]);
        let sel = selection(0.0, &["A"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        let a = &table.rows[0];
        assert!((a.total_sum - 100.0).abs() < f64::EPSILON);
        assert!((a.subset_sum - 10.0).abs() < f64::EPSILON);
        assert!((a.intensity - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_unselected_months_excluded_from_both_sums() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("A", "2024-01", 10.0, 0.0),
            make_reading("A", "2024-02", 50.0, 0.0),
        ]);
        let sel = selection(10.0, &["A"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert!((table.rows[0].total_sum - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_stations_selected_aborts() {
        let (ds, coords) = dataset_and_coords(vec![make_reading("A", "2024-01", 10.0, 0.0)]);
        let sel = FilterSelection {
            max_precipitation_mm: 10.0,
            months: ["2024-01".to_string()].into_iter().collect(),
            stations: BTreeSet::new(),
            metric: CountMetric::Raw,
        };

        let err = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap_err();
        assert!(matches!(err, VeloError::NoStationsSelected));
    }

    #[test]
    fn test_no_matching_rows_yields_empty_table() {
        let (ds, coords) = dataset_and_coords(vec![make_reading("A", "2024-01", 10.0, 0.0)]);
        let sel = selection(10.0, &["A"], &["2030-12"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.station_count(), 0);
        assert_eq!(table.subset_total, 0.0);
        assert_eq!(table.grand_total, 0.0);
    }

    // ── Unmapped stations ─────────────────────────────────────────────────────

    #[test]
    fn test_station_without_coordinates_reported_not_dropped() {
        let mut blind = make_reading("Hidden", "2024-01", 42.0, 0.0);
        blind.lat = None;
        blind.lon = None;
        let readings = vec![blind, make_reading("A", "2024-01", 10.0, 0.0)];
        let (ds, coords) = dataset_and_coords(readings);
        let sel = selection(10.0, &["A", "Hidden"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.unmapped.len(), 1);
        assert_eq!(table.unmapped[0].station, "Hidden");
        assert!((table.unmapped[0].subset_sum - 42.0).abs() < f64::EPSILON);
        assert!((table.unmapped[0].intensity - 1.0).abs() < 1e-9);
        // Unmapped sums still count toward the table totals.
        assert!((table.subset_total - 52.0).abs() < 1e-9);
    }

    // ── Ordering and metric choice ────────────────────────────────────────────

    #[test]
    fn test_rows_ordered_by_station_name() {
        let (ds, coords) = dataset_and_coords(vec![
            make_reading("Zoo", "2024-01", 1.0, 0.0),
            make_reading("Anna", "2024-01", 1.0, 0.0),
            make_reading("Mitte", "2024-01", 1.0, 0.0),
        ]);
        let sel = selection(10.0, &["Zoo", "Anna", "Mitte"], &["2024-01"]);

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r.station.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Mitte", "Zoo"]);
    }

    #[test]
    fn test_normalized_metric_used_when_selected() {
        let mut r1 = make_reading("A", "2024-01", 100.0, 0.0);
        r1.normalized_count = Some(0.25);
        let mut r2 = make_reading("A", "2024-01", 300.0, 20.0);
        r2.normalized_count = Some(0.75);
        let coords = CoordinateIndex::build(&[r1.clone(), r2.clone()], 4);
        let ds = Dataset::new(vec![r1, r2], true, true);

        let mut sel = selection(0.0, &["A"], &["2024-01"]);
        sel.metric = CountMetric::Normalized;

        let table = StationIntensityAggregator::summarize(&ds, &coords, &sel).unwrap();
        let a = &table.rows[0];
        assert!((a.total_sum - 1.0).abs() < 1e-9);
        assert!((a.subset_sum - 0.25).abs() < 1e-9);
        assert!((a.intensity - 0.25).abs() < 1e-9);
    }
}
