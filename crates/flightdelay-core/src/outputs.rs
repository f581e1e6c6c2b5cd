use bytes::Bytes;
use flightdelay_bucket::{BucketStore, CSV_CONTENT_TYPE};
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::reports::ReportKind;

/// Location and size of an object written by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedObject {
    pub key: String,
    pub uri: String,
    pub rows: usize,
    pub bytes: usize,
}

pub fn report_key(prefix: &str, kind: ReportKind) -> String {
    format!("{prefix}{}.csv", kind.code())
}

/// Serializes `df` as CSV and uploads it under `key`.
pub async fn publish_frame(
    store: &dyn BucketStore,
    key: &str,
    df: &DataFrame,
) -> Result<PublishedObject> {
    let csv_bytes = create_csv_bytes(df)?;
    let size = csv_bytes.len();

    store
        .put_object(key, Bytes::from(csv_bytes), CSV_CONTENT_TYPE)
        .await?;

    let published = PublishedObject {
        key: key.to_string(),
        uri: store.object_uri(key),
        rows: df.height(),
        bytes: size,
    };
    info!(uri = %published.uri, rows = published.rows, "published frame");
    Ok(published)
}

pub fn create_csv_bytes(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut clone)?;
    Ok(buffer)
}
