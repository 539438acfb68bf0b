use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which count column feeds the per-station aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMetric {
    /// Use the raw bicycle count column.
    Raw,
    /// Use the pre-computed normalized count column (only available when the
    /// dataset carries one).
    Normalized,
}

impl CountMetric {
    /// Short label for display in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            CountMetric::Raw => "count",
            CountMetric::Normalized => "normalized",
        }
    }
}

/// A single sensor reading: one station, one month, one weather context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Station name, whitespace-normalized at load time.
    pub station: String,
    /// Latitude in degrees; `None` when missing or unparseable.
    pub lat: Option<f64>,
    /// Longitude in degrees; `None` when missing or unparseable.
    pub lon: Option<f64>,
    /// Raw bicycle count for the period.
    pub count: f64,
    /// Pre-normalized count, when the dataset provides the column.
    #[serde(default)]
    pub normalized_count: Option<f64>,
    /// Accumulated precipitation in millimetres for the period.
    #[serde(default)]
    pub precipitation_mm: f64,
    /// Month label in `"YYYY-MM"` form.
    pub month: String,
    /// Calendar date of the reading, when the dataset provides one.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Reading {
    /// `true` when both coordinate components are present.
    pub fn has_location(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// The user's current filter state, rebuilt on every interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    /// Readings with precipitation above this threshold are excluded from
    /// the subset sum (the total baseline ignores it).
    pub max_precipitation_mm: f64,
    /// Months (`"YYYY-MM"`) included in both sums.
    pub months: BTreeSet<String>,
    /// Stations (normalized names) included in both sums.
    pub stations: BTreeSet<String>,
    /// Count column used for both sums.
    pub metric: CountMetric,
}

impl FilterSelection {
    /// `true` when `reading` falls inside the baseline filter: selected
    /// month and selected station, precipitation ignored.
    pub fn matches_baseline(&self, reading: &Reading) -> bool {
        self.months.contains(&reading.month) && self.stations.contains(&reading.station)
    }

    /// `true` when `reading` additionally passes the precipitation
    /// threshold (the subset / numerator filter).
    pub fn matches_subset(&self, reading: &Reading) -> bool {
        self.matches_baseline(reading) && reading.precipitation_mm <= self.max_precipitation_mm
    }
}

/// One summary row per selected station with a known location.
///
/// `intensity` is the station's subset share of its precipitation-
/// independent total, clipped to `[0, 1]`, and defined as `0.0` when the
/// total is zero.
#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    /// Normalized station name.
    pub station: String,
    /// Canonical latitude.
    pub lat: f64,
    /// Canonical longitude.
    pub lon: f64,
    /// Metric sum over readings passing the full filter (incl. rain).
    pub subset_sum: f64,
    /// Metric sum over readings passing the baseline filter (rain ignored).
    pub total_sum: f64,
    /// `clip(subset_sum / total_sum, 0, 1)`, or `0.0` when `total_sum == 0`.
    pub intensity: f64,
}

/// A selected station that could not be placed on the map.
///
/// Carries the same sums so the data-quality panel can show what is being
/// left off the map instead of dropping it silently.
#[derive(Debug, Clone, Serialize)]
pub struct UnmappedStation {
    /// Normalized station name.
    pub station: String,
    /// Metric sum over readings passing the full filter.
    pub subset_sum: f64,
    /// Metric sum over readings passing the baseline filter.
    pub total_sum: f64,
    /// Same definition as [`StationSummary::intensity`].
    pub intensity: f64,
}

/// Normalise a raw station name into its canonical key.
///
/// Trims leading/trailing whitespace and collapses interior runs of
/// whitespace to a single space. Station identity everywhere in the
/// pipeline is defined over this form.
///
/// # Examples
///
/// ```
/// use velo_core::models::normalize_station_name;
///
/// assert_eq!(normalize_station_name("  Neutor  "), "Neutor");
/// assert_eq!(normalize_station_name("Wolbecker\t Straße"), "Wolbecker Straße");
/// assert_eq!(normalize_station_name(""), "");
/// ```
pub fn normalize_station_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
