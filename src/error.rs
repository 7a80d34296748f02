//! Error taxonomy for the summarizer and the request boundary.
//!
//! [`ParseError`] is the only failure the pure summarization path can produce.
//! [`AnalyzeError`] wraps it together with validation and fetch failures so the
//! HTTP layer can map each class onto a status code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No columns to parse from input")]
    Empty,
    #[error("EOF inside quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("Expected {expected} fields in line {line}, saw {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid file URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Response from '{url}' is not valid {encoding} text")]
    Decode { url: String, encoding: &'static str },
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Summarization task failed: {0}")]
    Task(String),
}

impl AnalyzeError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalyzeError::Validation(_))
    }
}
