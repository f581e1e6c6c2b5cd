// crates/flightdelay-core/src/error.rs

use flightdelay_bucket::BucketError;
use thiserror::Error;

use crate::reports::ReportError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Object storage error: {0}")]
    Bucket(#[from] BucketError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report failed: {0}")]
    Report(#[from] ReportError),

    #[error("Input dataset has no header row")]
    MissingHeader,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
