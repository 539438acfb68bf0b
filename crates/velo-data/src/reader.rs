//! CSV file discovery and loading for velo-monitor.
//!
//! Reads bicycle-count exports (one row per station and month) and converts
//! them into [`Reading`] structs for downstream processing. The original
//! exports carry German column headers; English spellings are accepted as
//! aliases so re-exported datasets load unchanged.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};
use velo_core::error::{Result, VeloError};
use velo_core::models::{normalize_station_name, Reading};

// ── Public API ────────────────────────────────────────────────────────────────

/// Everything read from the data path in one pass.
#[derive(Debug, Clone)]
pub struct LoadedReadings {
    /// All readings, sorted by (date, month, station, input order). This is
    /// the defined sort order used for canonical-coordinate tie-breaks.
    pub readings: Vec<Reading>,
    /// Number of CSV files that contributed rows.
    pub files_loaded: usize,
    /// Rows dropped because they could not be parsed.
    pub rows_skipped: usize,
    /// `true` when every loaded file carries a normalized-count column.
    pub has_normalized: bool,
    /// `true` when every loaded file carries a precipitation column.
    pub has_precipitation: bool,
}

/// Find all `.csv` files under `data_path`, sorted by path.
///
/// A path pointing directly at a CSV file yields just that file; a
/// directory is scanned recursively.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if data_path.is_file() {
        return if has_csv_extension(data_path) {
            vec![data_path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_csv_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load and parse every CSV file under `data_path` into [`Reading`]s.
///
/// * A missing path → [`VeloError::DataPathNotFound`].
/// * A path with no CSV files → [`VeloError::NoDataFiles`].
/// * A file without the required station/count columns →
///   [`VeloError::MissingColumn`].
///
/// Individual rows that fail to parse are skipped with a debug log and
/// counted in [`LoadedReadings::rows_skipped`].
pub fn load_readings(data_path: &Path) -> Result<LoadedReadings> {
    if !data_path.exists() {
        return Err(VeloError::DataPathNotFound(data_path.to_path_buf()));
    }

    let csv_files = find_csv_files(data_path);
    if csv_files.is_empty() {
        return Err(VeloError::NoDataFiles(data_path.to_path_buf()));
    }

    let mut readings: Vec<Reading> = Vec::new();
    let mut rows_skipped = 0usize;
    let mut has_normalized = true;
    let mut has_precipitation = true;

    for file_path in &csv_files {
        let file = process_single_file(file_path)?;
        readings.extend(file.readings);
        rows_skipped += file.rows_skipped;
        has_normalized &= file.has_normalized;
        has_precipitation &= file.has_precipitation;
    }

    // Defined sort order: date first (undated rows last), then month label,
    // then station. `sort_by` is stable, so equal keys keep input order.
    readings.sort_by(|a, b| {
        let a_date = a.date.map_or((1, NaiveDate::MAX), |d| (0, d));
        let b_date = b.date.map_or((1, NaiveDate::MAX), |d| (0, d));
        a_date
            .cmp(&b_date)
            .then_with(|| a.month.cmp(&b.month))
            .then_with(|| a.station.cmp(&b.station))
    });

    debug!(
        "Loaded {} readings from {} files ({} rows skipped)",
        readings.len(),
        csv_files.len(),
        rows_skipped
    );

    Ok(LoadedReadings {
        readings,
        files_loaded: csv_files.len(),
        rows_skipped,
        has_normalized,
        has_precipitation,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Column positions resolved from one file's header row.
///
/// Station and count are mandatory; everything else degrades gracefully
/// (absent coordinates → unmappable stations, absent precipitation → rain
/// filter disabled, absent normalized column → metric option disabled).
#[derive(Debug, Clone)]
struct HeaderIndex {
    station: usize,
    count: usize,
    lat: Option<usize>,
    lon: Option<usize>,
    normalized: Option<usize>,
    precipitation: Option<usize>,
    month: Option<usize>,
    date: Option<usize>,
}

/// Accepted header spellings, checked case-insensitively.
const STATION_ALIASES: &[&str] = &["station", "standort"];
const COUNT_ALIASES: &[&str] = &["zaehldaten", "zähldaten", "count", "counts"];
const LAT_ALIASES: &[&str] = &["lat", "latitude", "breitengrad"];
const LON_ALIASES: &[&str] = &["lon", "lng", "longitude", "laengengrad", "längengrad"];
const NORMALIZED_ALIASES: &[&str] = &["normalized_count", "normalised_count", "zaehldaten_normiert"];
const PRECIPITATION_ALIASES: &[&str] = &["niederschlag_mm", "precipitation_mm", "rain_mm", "niederschlag"];
const MONTH_ALIASES: &[&str] = &["jahr_monat", "month", "monat"];
const DATE_ALIASES: &[&str] = &["datum", "date"];

impl HeaderIndex {
    /// Resolve column positions from the header record.
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| -> Option<usize> {
            headers.iter().position(|h| {
                let h = h.trim();
                aliases.iter().any(|a| h.eq_ignore_ascii_case(a))
            })
        };

        let station = find(STATION_ALIASES)
            .ok_or_else(|| VeloError::MissingColumn("Station".to_string()))?;
        let count = find(COUNT_ALIASES)
            .ok_or_else(|| VeloError::MissingColumn("Zaehldaten".to_string()))?;

        let month = find(MONTH_ALIASES);
        let date = find(DATE_ALIASES);
        if month.is_none() && date.is_none() {
            return Err(VeloError::MissingColumn("Jahr_Monat".to_string()));
        }

        Ok(Self {
            station,
            count,
            lat: find(LAT_ALIASES),
            lon: find(LON_ALIASES),
            normalized: find(NORMALIZED_ALIASES),
            precipitation: find(PRECIPITATION_ALIASES),
            month,
            date,
        })
    }
}

/// Parsed contents of a single CSV file.
struct FileReadings {
    readings: Vec<Reading>,
    rows_skipped: usize,
    has_normalized: bool,
    has_precipitation: bool,
}

/// Read one CSV file into [`Reading`]s, skipping unparseable rows.
fn process_single_file(file_path: &Path) -> Result<FileReadings> {
    let file = std::fs::File::open(file_path).map_err(|source| VeloError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let idx = HeaderIndex::resolve(rdr.headers()?)?;

    let mut readings: Vec<Reading> = Vec::new();
    let mut rows_skipped = 0usize;

    for record_result in rdr.records() {
        let record = match record_result {
            Ok(r) => r,
            Err(e) => {
                debug!("Unreadable row in {}: {}", file_path.display(), e);
                rows_skipped += 1;
                continue;
            }
        };

        match parse_reading(&record, &idx) {
            Some(reading) => readings.push(reading),
            None => {
                debug!(
                    "Skipping row {:?} in {}",
                    record.position().map(|p| p.line()),
                    file_path.display()
                );
                rows_skipped += 1;
            }
        }
    }

    debug!(
        "File {}: {} readings, {} skipped",
        file_path.display(),
        readings.len(),
        rows_skipped
    );

    Ok(FileReadings {
        readings,
        rows_skipped,
        has_normalized: idx.normalized.is_some(),
        has_precipitation: idx.precipitation.is_some(),
    })
}

/// Map one CSV record to a [`Reading`], returning `None` when the row is
/// unusable (blank station, unparseable count, no month and no date).
fn parse_reading(record: &StringRecord, idx: &HeaderIndex) -> Option<Reading> {
    let station = normalize_station_name(record.get(idx.station)?);
    if station.is_empty() {
        return None;
    }

    let count: f64 = parse_field(record, Some(idx.count))?;

    let lat = parse_field(record, idx.lat).filter(|v: &f64| v.is_finite());
    let lon = parse_field(record, idx.lon).filter(|v: &f64| v.is_finite());

    let normalized_count = parse_field(record, idx.normalized);
    let precipitation_mm = parse_field(record, idx.precipitation).unwrap_or(0.0);

    let date = idx
        .date
        .and_then(|i| record.get(i))
        .and_then(parse_date);

    // Month label: explicit column wins; otherwise derive from the date.
    let month = idx
        .month
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| date.map(|d| d.format("%Y-%m").to_string()))?;

    Some(Reading {
        station,
        lat,
        lon,
        count,
        normalized_count,
        precipitation_mm,
        month,
        date,
    })
}

/// Parse an optional numeric field; `None` for absent columns, absent cells
/// and unparseable values.
fn parse_field(record: &StringRecord, index: Option<usize>) -> Option<f64> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Parse a date cell, accepting ISO (`2024-01-15`) and German
/// (`15.01.2024`) forms.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%d.%m.%Y"))
        .ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
