//! The session dataset catalog.
//!
//! [`Dataset`] owns the sorted readings together with facts derived once at
//! load time: the selectable months and stations, the precipitation range,
//! and which optional columns the files actually carried.

use std::collections::BTreeSet;

use velo_core::models::{CountMetric, FilterSelection, Reading};

/// Immutable catalog built once per session from the loaded readings.
#[derive(Debug, Clone)]
pub struct Dataset {
    readings: Vec<Reading>,
    months: Vec<String>,
    stations: Vec<String>,
    max_precipitation_mm: f64,
    has_normalized: bool,
    has_precipitation: bool,
}

impl Dataset {
    /// Build the catalog. `readings` must already be in the reader's
    /// defined sort order; the catalog never reorders them.
    pub fn new(readings: Vec<Reading>, has_normalized: bool, has_precipitation: bool) -> Self {
        let mut months: BTreeSet<String> = BTreeSet::new();
        let mut stations: BTreeSet<String> = BTreeSet::new();
        let mut max_precipitation_mm = 0.0f64;

        for reading in &readings {
            months.insert(reading.month.clone());
            stations.insert(reading.station.clone());
            max_precipitation_mm = max_precipitation_mm.max(reading.precipitation_mm);
        }

        Self {
            readings,
            months: months.into_iter().collect(),
            stations: stations.into_iter().collect(),
            max_precipitation_mm,
            has_normalized,
            has_precipitation,
        }
    }

    /// All readings in defined sort order.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Distinct month labels, ascending.
    pub fn months(&self) -> &[String] {
        &self.months
    }

    /// Distinct normalized station names, ascending.
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Highest precipitation value seen in the dataset.
    pub fn max_precipitation_mm(&self) -> f64 {
        self.max_precipitation_mm
    }

    /// `true` when the normalized-count metric can be offered.
    pub fn has_normalized(&self) -> bool {
        self.has_normalized
    }

    /// `true` when the dataset carries precipitation data at all. When
    /// `false` the rain filter is meaningless and the UI disables it.
    pub fn has_precipitation(&self) -> bool {
        self.has_precipitation
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// The metric value of one reading under the chosen column.
    ///
    /// A `Normalized` request falls back to the raw count for readings
    /// without a normalized value, so a partially-populated column never
    /// zeroes out a station.
    pub fn metric_value(&self, reading: &Reading, metric: CountMetric) -> f64 {
        match metric {
            CountMetric::Raw => reading.count,
            CountMetric::Normalized => reading.normalized_count.unwrap_or(reading.count),
        }
    }

    /// The all-inclusive starting selection: every month, every station,
    /// threshold at the dataset maximum, raw metric.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection {
            max_precipitation_mm: self.max_precipitation_mm,
            months: self.months.iter().cloned().collect(),
            stations: self.stations.iter().cloned().collect(),
            metric: CountMetric::Raw,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reading(station: &str, month: &str, count: f64, rain: f64) -> Reading {
        Reading {
            station: station.to_string(),
            lat: None,
            lon: None,
            count,
            normalized_count: None,
            precipitation_mm: rain,
            month: month.to_string(),
            date: None,
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                make_reading("Neutor", "2024-01", 100.0, 10.0),
                make_reading("Roggenmarkt", "2024-01", 200.0, 10.0),
                make_reading("Neutor", "2024-02", 300.0, 55.5),
            ],
            false,
            true,
        )
    }

    #[test]
    fn test_months_sorted_unique() {
        let ds = sample_dataset();
        assert_eq!(ds.months(), &["2024-01".to_string(), "2024-02".to_string()]);
    }

    #[test]
    fn test_stations_sorted_unique() {
        let ds = sample_dataset();
        assert_eq!(
            ds.stations(),
            &["Neutor".to_string(), "Roggenmarkt".to_string()]
        );
    }

    #[test]
    fn test_max_precipitation() {
        let ds = sample_dataset();
        assert!((ds.max_precipitation_mm() - 55.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(vec![], true, true);
        assert!(ds.is_empty());
        assert_eq!(ds.len(), 0);
        assert!(ds.months().is_empty());
        assert!(ds.stations().is_empty());
        assert_eq!(ds.max_precipitation_mm(), 0.0);
    }

    #[test]
    fn test_metric_value_raw() {
        let ds = sample_dataset();
        let r = make_reading("Neutor", "2024-01", 42.0, 0.0);
        assert_eq!(ds.metric_value(&r, CountMetric::Raw), 42.0);
    }

    #[test]
    fn test_metric_value_normalized_falls_back_to_raw() {
        let ds = sample_dataset();
        let mut r = make_reading("Neutor", "2024-01", 42.0, 0.0);
        assert_eq!(ds.metric_value(&r, CountMetric::Normalized), 42.0);
        r.normalized_count = Some(0.7);
        assert_eq!(ds.metric_value(&r, CountMetric::Normalized), 0.7);
    }

    #[test]
    fn test_default_selection_is_all_inclusive() {
        let ds = sample_dataset();
        let sel = ds.default_selection();
        assert_eq!(sel.months.len(), 2);
        assert_eq!(sel.stations.len(), 2);
        assert!((sel.max_precipitation_mm - 55.5).abs() < f64::EPSILON);
        assert_eq!(sel.metric, CountMetric::Raw);

        // Every reading passes both filters under the default selection.
        for r in ds.readings() {
            assert!(sel.matches_baseline(r));
            assert!(sel.matches_subset(r));
        }
    }
}
