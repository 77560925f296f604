//! Error type shared by the extractors, the pipeline driver and the warehouse runner.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("File not found or unreadable: {0}")]
    MissingFile(PathBuf),

    #[error("Malformed record in {path} (line {line}): {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Database write failed: {0}")]
    Write(#[from] rusqlite::Error),

    #[error("Warehouse statement failed: {0}")]
    Warehouse(#[from] tokio_postgres::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        EtlError::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type EtlResult<T> = Result<T, EtlError>;
