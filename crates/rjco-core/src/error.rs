//! Error types for rjco-core

use thiserror::Error;

/// Main error type for rjco-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected CSV layout: {0}")]
    CsvSchema(String),

    #[error("Text decoding error: {0}")]
    Encoding(String),

    #[error("Invalid case code: {0}")]
    InvalidCaseCode(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rjco-core
pub type Result<T> = std::result::Result<T, Error>;
