use blake3::Hasher;
use csv::ReaderBuilder;
use flightdelay_classifier::FlightRecord;

use crate::error::{PipelineError, Result};

/// Raw rows of one CSV object, in file order.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub headers: Vec<String>,
    pub records: Vec<FlightRecord>,
    pub input_hash: String,
}

/// Reads a headed CSV into records. Short rows leave the trailing fields unset
/// and values past the last header are ignored.
pub fn read_records(contents: &[u8]) -> Result<RecordBatch> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(PipelineError::MissingHeader);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(FlightRecord::from_pairs(
            headers.iter().map(String::as_str).zip(row.iter()),
        ));
    }

    Ok(RecordBatch {
        headers,
        records,
        input_hash: compute_hash(contents),
    })
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
