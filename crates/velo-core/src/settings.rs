use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Interactive bicycle-traffic heatmap dashboard for the terminal
#[derive(Parser, Debug, Clone)]
#[command(
    name = "velo-monitor",
    about = "Interactive bicycle-traffic heatmap dashboard for the terminal",
    version
)]
pub struct Settings {
    /// Dataset path: a CSV file or a directory scanned for CSV files
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// View shown at startup
    #[arg(long, default_value = "map", value_parser = ["map", "table"])]
    pub view: String,

    /// Count column used for aggregation
    #[arg(long, default_value = "raw", value_parser = ["raw", "normalized"])]
    pub metric: String,

    /// Maximum monthly precipitation in mm (defaults to include all data)
    #[arg(long)]
    pub max_rain: Option<f64>,

    /// Months to preselect, comma-separated (YYYY-MM); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub months: Vec<String>,

    /// Stations to preselect, comma-separated; all when omitted
    #[arg(long, value_delimiter = ',')]
    pub stations: Vec<String>,

    /// Decimal places used when rounding coordinates (0-8)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(0..=8))]
    pub precision: u32,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.velo-monitor/last_used.json`.
///
/// Only presentation preferences are persisted; filter state (months,
/// stations, rain threshold) is dataset-dependent and always starts fresh.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.velo-monitor/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".velo-monitor").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug_override(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Merge last-used values for fields that were NOT explicitly set on
        // the command line (CLI always wins). Filter flags are never merged.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "metric") {
            if let Some(v) = last.metric {
                settings.metric = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "precision") {
            if let Some(v) = last.precision {
                settings.precision = v;
            }
        }

        settings = Self::apply_debug_override(settings);

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides the configured log level.
    fn apply_debug_override(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            metric: Some(s.metric.clone()),
            precision: Some(s.precision),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Build the config path inside `tmp`.
    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("table".to_string()),
            metric: Some("normalized".to_string()),
            precision: Some(5),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.view, Some("table".to_string()));
        assert_eq!(loaded.metric, Some("normalized".to_string()));
        assert_eq!(loaded.precision, Some(5));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            theme: Some("light".to_string()),
            ..Default::default()
        };
        params.save_to(&path).expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.theme.is_none());
        assert!(loaded.view.is_none());
        assert!(loaded.metric.is_none());
        assert!(loaded.precision.is_none());
    }

    // ── Settings defaults ─────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["velo-monitor"]);

        assert!(settings.data.is_none());
        assert_eq!(settings.view, "map");
        assert_eq!(settings.metric, "raw");
        assert!(settings.max_rain.is_none());
        assert!(settings.months.is_empty());
        assert!(settings.stations.is_empty());
        assert_eq!(settings.precision, 4);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_comma_separated_lists() {
        let settings = Settings::parse_from([
            "velo-monitor",
            "--months",
            "2024-01,2024-02",
            "--stations",
            "Neutor,Roggenmarkt",
        ]);
        assert_eq!(settings.months, vec!["2024-01", "2024-02"]);
        assert_eq!(settings.stations, vec!["Neutor", "Roggenmarkt"]);
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_cli_value_wins_over_last_used() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("table".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(args(&["velo-monitor", "--view", "map"]), &path);
        assert_eq!(settings.view, "map");
    }

    #[test]
    fn test_last_used_fills_unset_field() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("table".to_string()),
            metric: Some("normalized".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["velo-monitor"]), &path);
        assert_eq!(settings.view, "table");
        assert_eq!(settings.metric, "normalized");
    }

    #[test]
    fn test_load_persists_current_settings() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        let _ =
            Settings::load_with_last_used_impl(args(&["velo-monitor", "--theme", "light"]), &path);

        let saved = LastUsedParams::load_from(&path);
        assert_eq!(saved.theme, Some("light".to_string()));
    }

    #[test]
    fn test_clear_flag_removes_config() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let _ = Settings::load_with_last_used_impl(args(&["velo-monitor", "--clear"]), &path);
        assert!(!path.exists(), "config must be cleared");
    }

    #[test]
    fn test_debug_flag_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let settings =
            Settings::load_with_last_used_impl(args(&["velo-monitor", "--debug"]), &path);
        assert_eq!(settings.log_level, "DEBUG");
    }

    // ── From<&Settings> ───────────────────────────────────────────────────────

    #[test]
    fn test_from_settings_to_last_used() {
        let settings = Settings::parse_from([
            "velo-monitor",
            "--theme",
            "classic",
            "--view",
            "table",
            "--metric",
            "normalized",
            "--precision",
            "6",
        ]);
        let params = LastUsedParams::from(&settings);
        assert_eq!(params.theme, Some("classic".to_string()));
        assert_eq!(params.view, Some("table".to_string()));
        assert_eq!(params.metric, Some("normalized".to_string()));
        assert_eq!(params.precision, Some(6));
    }
}
