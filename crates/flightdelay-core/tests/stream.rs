use bytes::Bytes;
use flightdelay_bucket::{BucketStore, InMemoryBucketStore, CSV_CONTENT_TYPE};
use flightdelay_core::config::ObjectKeys;
use flightdelay_core::ingestion::read_records;
use flightdelay_core::stream::{
    handle_event, output_headers, run_stream_transform, transform_records, write_enriched_csv,
};

fn fixture(name: &str) -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    std::fs::read(path).expect("read fixture")
}

async fn seeded_store(keys: &ObjectKeys) -> InMemoryBucketStore {
    let store = InMemoryBucketStore::new("flight-delays-data-bucket");
    store
        .put_object(
            &keys.raw,
            Bytes::from(fixture("flight_delays.csv")),
            CSV_CONTENT_TYPE,
        )
        .await
        .unwrap();
    store
}

fn read_output(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[test]
fn transform_counts_accepted_and_rejected_rows() {
    let batch = read_records(&fixture("flight_delays.csv")).unwrap();
    assert_eq!(batch.records.len(), 18);

    let output = transform_records(batch);
    assert_eq!(output.accepted.len(), 12);
    assert_eq!(output.rejections.total(), 6);
    assert_eq!(output.rejections.get("invalid_delay_minutes"), 3);
    assert_eq!(output.rejections.get("missing_departure"), 1);
    assert_eq!(output.rejections.get("missing_date_time_separator"), 1);
    assert_eq!(output.rejections.get("malformed_hour"), 1);
}

#[test]
fn output_headers_append_derived_columns_once() {
    let headers: Vec<String> = ["FlightID", "DelayMinutes", "DelayReason"]
        .map(String::from)
        .to_vec();
    assert_eq!(
        output_headers(&headers),
        [
            "FlightID",
            "DelayMinutes",
            "DelayReason",
            "IsDelayed",
            "TimeOfDay",
            "DelayCategory"
        ]
    );

    let without_reason: Vec<String> = ["ScheduledDeparture", "IsDelayed"].map(String::from).to_vec();
    assert_eq!(
        output_headers(&without_reason),
        [
            "ScheduledDeparture",
            "IsDelayed",
            "DelayReason",
            "TimeOfDay",
            "DelayCategory"
        ]
    );
}

#[test]
fn enriched_csv_preserves_column_order() {
    let content = b"ScheduledDeparture,Airline,DelayMinutes\n2024-05-01T07:10:00,AA,0\n";
    let output = transform_records(read_records(content).unwrap());
    let bytes = write_enriched_csv(&output.headers, &output.accepted).unwrap();

    let (headers, rows) = read_output(&bytes);
    assert_eq!(
        headers,
        [
            "ScheduledDeparture",
            "Airline",
            "DelayMinutes",
            "DelayReason",
            "IsDelayed",
            "TimeOfDay",
            "DelayCategory"
        ]
    );
    assert_eq!(
        rows,
        vec![vec![
            "2024-05-01T07:10:00",
            "AA",
            "0",
            "On Time",
            "False",
            "Morning",
            "On Time"
        ]]
    );
}

#[tokio::test]
async fn stream_transform_uploads_processed_csv() {
    let keys = ObjectKeys::default();
    let store = seeded_store(&keys).await;

    let summary = run_stream_transform(&store, &keys).await.unwrap();
    assert_eq!(summary.rows_read, 18);
    assert_eq!(summary.accepted, 12);
    assert_eq!(summary.rejections.total(), 6);
    assert_eq!(
        summary.output_uri,
        "s3://flight-delays-data-bucket/flight_data_pipeline.csv"
    );
    assert_eq!(summary.input_hash.len(), 64);
    assert_eq!(
        store.content_type(&keys.processed).as_deref(),
        Some(CSV_CONTENT_TYPE)
    );

    let processed = store.get_object(&keys.processed).await.unwrap();
    let (headers, rows) = read_output(&processed);
    assert_eq!(headers.last().map(String::as_str), Some("DelayCategory"));
    assert_eq!(rows.len(), 12);

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let flight_id = column("FlightID");
    let reason = column("DelayReason");
    let delayed = column("IsDelayed");
    let time_of_day = column("TimeOfDay");
    let category = column("DelayCategory");

    let fl011 = rows.iter().find(|row| row[flight_id] == "FL011").unwrap();
    assert_eq!(fl011[reason], "On Time");
    assert_eq!(fl011[delayed], "False");
    assert_eq!(fl011[time_of_day], "Evening");
    assert_eq!(fl011[category], "On Time");

    let fl002 = rows.iter().find(|row| row[flight_id] == "FL002").unwrap();
    assert_eq!(fl002[reason], "Weather");
    assert_eq!(fl002[delayed], "True");
    assert_eq!(fl002[time_of_day], "Morning");
    assert_eq!(fl002[category], "Short Delay");

    for rejected in ["FL006", "FL007", "FL008", "FL009", "FL016", "FL017"] {
        assert!(
            rows.iter().all(|row| row[flight_id] != rejected),
            "{rejected} should have been dropped"
        );
    }
}

#[tokio::test]
async fn handle_event_reports_success() {
    let keys = ObjectKeys::default();
    let store = seeded_store(&keys).await;

    let response = handle_event(&store, &keys).await;
    assert!(response.is_success());
    assert_eq!(
        response.body,
        "Data processing complete. Processed data saved to: s3://flight-delays-data-bucket/flight_data_pipeline.csv"
    );

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["statusCode"], 200);
}

#[tokio::test]
async fn handle_event_maps_missing_input_to_failure() {
    let keys = ObjectKeys::default();
    let store = InMemoryBucketStore::new("flight-delays-data-bucket");

    let response = handle_event(&store, &keys).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.starts_with("Pipeline execution failed:"));
    assert!(response.body.contains("flight_delays.csv"));
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn empty_input_is_a_batch_failure() {
    let keys = ObjectKeys::default();
    let store = InMemoryBucketStore::new("flights");
    store
        .put_object(&keys.raw, Bytes::new(), CSV_CONTENT_TYPE)
        .await
        .unwrap();

    let err = run_stream_transform(&store, &keys).await.unwrap_err();
    assert!(matches!(
        err,
        flightdelay_core::PipelineError::MissingHeader
    ));
}
