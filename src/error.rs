//! Error types for POP Planner.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the editing boundary. The edited state is left untouched.
#[derive(Debug, Error)]
pub enum EditError {
    /// A required name was empty or whitespace only.
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    /// The cost text could not be read as a number.
    #[error("invalid cost '{input}': expected a number such as 120 or 99,90")]
    InvalidCost { input: String },

    /// The cost parsed but is below zero.
    #[error("cost must not be negative (got {value})")]
    NegativeCost { value: f64 },

    /// No entity matched the given id or name.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// The recurrence descriptor carries out-of-range values.
    #[error("invalid recurrence: {message}")]
    InvalidRecurrence { message: String },

    /// A date could not be read as YYYY-MM-DD.
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

/// Errors from the key-value storage medium.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No storage medium could be used.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    /// Failed to read a stored value.
    #[error("failed to read key '{key}': {source}")]
    Read {
        key: String,
        source: std::io::Error,
    },

    /// Failed to write a value.
    #[error("failed to write key '{key}': {source}")]
    Write {
        key: String,
        source: std::io::Error,
    },

    /// Failed to serialize a value to JSON.
    #[error("JSON serialization failed: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// The print view could not be opened (no opener, or it refused to start).
    #[error("could not open the print view for '{path}': {message}")]
    PrintViewUnavailable { path: PathBuf, message: String },
}

/// Errors from reading the environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// POP_PLANNER_PRINT_DELAY_MS was not a number of milliseconds.
    #[error("POP_PLANNER_PRINT_DELAY_MS must be a whole number of milliseconds (got '{value}')")]
    InvalidPrintDelay { value: String },

    /// POP_PLANNER_PRINT_DELAY_MS was above the accepted ceiling.
    #[error("POP_PLANNER_PRINT_DELAY_MS must be at most {max} (got {value})")]
    PrintDelayTooLong { value: u64, max: u64 },

    /// POP_PLANNER_STORAGE_KEY was empty or contained path separators.
    #[error("POP_PLANNER_STORAGE_KEY must be a plain, non-empty name (got '{value}')")]
    InvalidStorageKey { value: String },
}

/// Errors from installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive did not parse.
    #[error("invalid log level/filter '{value}': {source}")]
    EnvFilter {
        value: String,
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed.
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}
