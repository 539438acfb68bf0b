use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by velo-monitor.
#[derive(Error, Debug)]
pub enum VeloError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A column the pipeline cannot work without is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The expected data directory or file does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No CSV dataset files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// The aggregation was asked to run with an empty station selection.
    #[error("No stations selected")]
    NoStationsSelected,

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the velo crates.
pub type Result<T> = std::result::Result<T, VeloError>;
