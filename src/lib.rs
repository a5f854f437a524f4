//! Storyboard - An operational view over a spreadsheet of work items.
//!
//! This library provides the core functionality for the `sbd` CLI tool,
//! including story sheet ingestion, the overdue / at-risk / need-to-start
//! classifier, and storage of uploads and analysis results.

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;


/// Library-level error type for storyboard operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No story files uploaded yet")]
    NoUploads,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Row-level problems found in a story sheet, first few only.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for storyboard operations.
pub type Result<T> = std::result::Result<T, Error>;
