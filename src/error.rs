//! Error types for each stage of a run.
//!
//! Only [`ConfigError`] and [`InputError`] stop a run. Everything else is
//! absorbed by the stage that raised it and surfaced as a warning.

use thiserror::Error;

/// Problems with the process configuration. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found. Set RAINFOREST_API_KEY in the environment or .env file")]
    MissingApiKey,
    #[error("access password rejected")]
    PasswordRejected,
}

/// Problems with the identifier input. Fatal.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no ASINs supplied: enter at least one ASIN")]
    NoIdentifiers,
    #[error("failed to read ASIN file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single remote lookup failed. The batch keeps going.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The override file exists but could not be read.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to open override file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse override file: {0}")]
    Csv(#[from] csv::Error),
}

/// Writing the export failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("built without Excel workbook support")]
    Unsupported,
    #[error("workbook error: {0}")]
    Workbook(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
