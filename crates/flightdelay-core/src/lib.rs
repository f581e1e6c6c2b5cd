pub mod batch;
pub mod columnar;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod outputs;
pub mod profile;
pub mod reports;
pub mod stream;
pub mod tally;

pub use error::{PipelineError, Result};
