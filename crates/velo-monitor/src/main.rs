mod bootstrap;

use anyhow::Result;
use velo_core::models::{normalize_station_name, CountMetric, FilterSelection};
use velo_core::settings::Settings;
use velo_data::analysis::DatasetAnalysis;
use velo_runtime::dataset_cache::DatasetCache;
use velo_ui::app::{App, ViewMode};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("velo-monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Metric: {}, Theme: {}",
        settings.view,
        settings.metric,
        settings.theme
    );

    let Some(data_path) = settings.data.clone().or_else(bootstrap::discover_data_path) else {
        eprintln!(
            "No dataset found. Place the CSV export next to the binary or pass --data <file-or-directory>."
        );
        std::process::exit(1);
    };

    tracing::info!("Dataset path: {}", data_path.display());

    let mut cache = DatasetCache::new(data_path, settings.precision);

    // The initial load is the only disk access of the session; a failure
    // here is fatal and user-visible rather than an empty dashboard.
    let analysis = match cache.get(false) {
        Ok(analysis) => analysis.clone(),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if analysis.dataset.is_empty() {
        eprintln!("Dataset loaded but contains no usable rows.");
        std::process::exit(1);
    }

    let selection = build_initial_selection(&analysis, &settings);
    let view_mode = if settings.view == "table" {
        ViewMode::Table
    } else {
        ViewMode::Map
    };

    let app = App::new(&settings.theme, view_mode, &analysis, selection);
    app.run(&mut cache)?;

    Ok(())
}

/// Build the starting [`FilterSelection`] from the dataset defaults and any
/// filter flags given on the command line.
///
/// Unknown months/stations are ignored (the dataset defines the universe);
/// an explicit empty result is allowed and surfaces the "no stations
/// selected" prompt in the UI. The normalized metric silently falls back to
/// raw when the dataset has no such column.
fn build_initial_selection(analysis: &DatasetAnalysis, settings: &Settings) -> FilterSelection {
    let mut selection = analysis.dataset.default_selection();

    if !settings.months.is_empty() {
        let requested: Vec<String> = settings.months.iter().map(|m| m.trim().to_string()).collect();
        selection.months = analysis
            .dataset
            .months()
            .iter()
            .filter(|m| requested.contains(m))
            .cloned()
            .collect();
    }

    if !settings.stations.is_empty() {
        let requested: Vec<String> = settings
            .stations
            .iter()
            .map(|s| normalize_station_name(s))
            .collect();
        selection.stations = analysis
            .dataset
            .stations()
            .iter()
            .filter(|s| requested.contains(s))
            .cloned()
            .collect();
    }

    if let Some(max_rain) = settings.max_rain {
        selection.max_precipitation_mm =
            max_rain.clamp(0.0, analysis.dataset.max_precipitation_mm());
    }

    if settings.metric == "normalized" && analysis.dataset.has_normalized() {
        selection.metric = CountMetric::Normalized;
    }

    selection
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use velo_core::models::Reading;
    use velo_data::analysis::AnalysisMetadata;
    use velo_data::coords::CoordinateIndex;
    use velo_data::dataset::Dataset;

    fn make_reading(station: &str, month: &str, rain: f64) -> Reading {
        Reading {
            station: station.to_string(),
            lat: Some(51.9616),
            lon: Some(7.6284),
            count: 100.0,
            normalized_count: None,
            precipitation_mm: rain,
            month: month.to_string(),
            date: None,
        }
    }

    fn make_analysis(has_normalized: bool) -> DatasetAnalysis {
        let readings = vec![
            make_reading("Neutor", "2024-01", 10.0),
            make_reading("Roggenmarkt", "2024-02", 40.0),
        ];
        let coords = CoordinateIndex::build(&readings, 4);
        DatasetAnalysis {
            dataset: Dataset::new(readings, has_normalized, true),
            coords,
            metadata: AnalysisMetadata {
                generated_at: "2024-03-01T00:00:00Z".to_string(),
                files_loaded: 1,
                rows_loaded: 2,
                rows_skipped: 0,
                stations_located: 2,
                dummy_coordinate: None,
                load_time_seconds: 0.0,
                index_time_seconds: 0.0,
            },
        }
    }

    #[test]
    fn test_initial_selection_defaults_to_everything() {
        let analysis = make_analysis(false);
        let settings = Settings::parse_from(["velo-monitor"]);
        let selection = build_initial_selection(&analysis, &settings);

        assert_eq!(selection.months.len(), 2);
        assert_eq!(selection.stations.len(), 2);
        assert!((selection.max_precipitation_mm - 40.0).abs() < f64::EPSILON);
        assert_eq!(selection.metric, CountMetric::Raw);
    }

    #[test]
    fn test_initial_selection_honors_month_flag() {
        let analysis = make_analysis(false);
        let settings = Settings::parse_from(["velo-monitor", "--months", "2024-01,2030-01"]);
        let selection = build_initial_selection(&analysis, &settings);

        // The unknown month is dropped, the known one kept.
        assert_eq!(selection.months.len(), 1);
        assert!(selection.months.contains("2024-01"));
    }

    #[test]
    fn test_initial_selection_normalizes_station_flag() {
        let analysis = make_analysis(false);
        let settings = Settings::parse_from(["velo-monitor", "--stations", "  Neutor "]);
        let selection = build_initial_selection(&analysis, &settings);

        assert_eq!(selection.stations.len(), 1);
        assert!(selection.stations.contains("Neutor"));
    }

    #[test]
    fn test_initial_selection_clamps_max_rain() {
        let analysis = make_analysis(false);
        let settings = Settings::parse_from(["velo-monitor", "--max-rain", "999"]);
        let selection = build_initial_selection(&analysis, &settings);
        assert!((selection.max_precipitation_mm - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_initial_selection_metric_requires_column() {
        let settings = Settings::parse_from(["velo-monitor", "--metric", "normalized"]);

        let without = build_initial_selection(&make_analysis(false), &settings);
        assert_eq!(without.metric, CountMetric::Raw);

        let with = build_initial_selection(&make_analysis(true), &settings);
        assert_eq!(with.metric, CountMetric::Normalized);
    }
}
