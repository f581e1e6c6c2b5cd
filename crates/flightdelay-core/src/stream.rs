//! Row-at-a-time transform: one CSV object in, one enriched CSV object out.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use flightdelay_bucket::{BucketStore, CSV_CONTENT_TYPE};
use flightdelay_classifier::{classify, fields, Classification, EnrichedFlightRecord};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::ObjectKeys;
use crate::error::Result;
use crate::ingestion::{read_records, RecordBatch};
use crate::tally::RejectionTally;

#[derive(Debug, Clone)]
pub struct StreamOutput {
    pub headers: Vec<String>,
    pub accepted: Vec<EnrichedFlightRecord>,
    pub rejections: RejectionTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_uri: String,
    pub input_hash: String,
    pub output_uri: String,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejections: RejectionTally,
}

/// Response shape of the event-driven entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Output header: source columns, then `DelayReason` if the source lacked it,
/// then any derived column not already present.
pub fn output_headers(headers: &[String]) -> Vec<String> {
    let mut output = headers.to_vec();
    let extra = std::iter::once(fields::DELAY_REASON).chain(fields::DERIVED);
    for name in extra {
        if !output.iter().any(|existing| existing == name) {
            output.push(name.to_string());
        }
    }
    output
}

pub fn transform_records(batch: RecordBatch) -> StreamOutput {
    let mut accepted = Vec::with_capacity(batch.records.len());
    let mut rejections = RejectionTally::default();

    for (row, record) in batch.records.into_iter().enumerate() {
        match classify(record) {
            Classification::Accepted(enriched) => accepted.push(enriched),
            Classification::Rejected(rejection) => {
                debug!(row, reason = %rejection.reason, "dropping flight record");
                rejections.record(&rejection.reason);
            }
        }
    }

    StreamOutput {
        headers: output_headers(&batch.headers),
        accepted,
        rejections,
    }
}

pub fn write_enriched_csv(headers: &[String], records: &[EnrichedFlightRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(headers)?;
    for record in records {
        writer.write_record(
            headers
                .iter()
                .map(|name| record.field(name).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|err| std::io::Error::other(err.to_string()).into())
}

pub async fn run_stream_transform(
    store: &dyn BucketStore,
    keys: &ObjectKeys,
) -> Result<StreamSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let input_uri = store.object_uri(&keys.raw);
    info!(%run_id, input = %input_uri, "downloading raw flight data");

    let contents = store.get_object(&keys.raw).await?;
    let batch = read_records(&contents)?;
    let input_hash = batch.input_hash.clone();
    let rows_read = batch.records.len();

    let output = transform_records(batch);
    let csv_bytes = write_enriched_csv(&output.headers, &output.accepted)?;

    let output_uri = store.object_uri(&keys.processed);
    info!(%run_id, output = %output_uri, "uploading processed flight data");
    store
        .put_object(&keys.processed, Bytes::from(csv_bytes), CSV_CONTENT_TYPE)
        .await?;

    let summary = StreamSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        input_uri,
        input_hash,
        output_uri,
        rows_read,
        accepted: output.accepted.len(),
        rejections: output.rejections,
    };
    info!(
        %run_id,
        rows_read = summary.rows_read,
        accepted = summary.accepted,
        rejected = summary.rejections.total(),
        "stream transform finished"
    );
    Ok(summary)
}

/// Runs the stream transform and folds the outcome into a status response.
pub async fn handle_event(store: &dyn BucketStore, keys: &ObjectKeys) -> HandlerResponse {
    match run_stream_transform(store, keys).await {
        Ok(summary) => HandlerResponse {
            status_code: 200,
            body: format!(
                "Data processing complete. Processed data saved to: {}",
                summary.output_uri
            ),
        },
        Err(err) => {
            error!(error = %err, "stream transform failed");
            HandlerResponse {
                status_code: 500,
                body: format!("Pipeline execution failed: {err}"),
            }
        }
    }
}
