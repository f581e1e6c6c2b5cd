use bytes::Bytes;
use flightdelay_bucket::{BucketStore, InMemoryBucketStore, CSV_CONTENT_TYPE};
use flightdelay_core::batch::run_batch;
use flightdelay_core::columnar::read_flights_csv;
use flightdelay_core::config::ObjectKeys;
use flightdelay_core::reports::ReportKind;

fn fixture(name: &str) -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    std::fs::read(path).expect("read fixture")
}

#[tokio::test]
async fn batch_publishes_enriched_dataset_and_reports() {
    let keys = ObjectKeys {
        reports_prefix: "analytics/".to_string(),
        ..ObjectKeys::default()
    };
    let store = InMemoryBucketStore::new("flight-delays-data-bucket");
    store
        .put_object(
            &keys.raw,
            Bytes::from(fixture("flight_delays.csv")),
            CSV_CONTENT_TYPE,
        )
        .await
        .unwrap();

    let run = run_batch(&store, &keys).await.unwrap();
    let summary = &run.summary;

    assert_eq!(summary.rows_read, 18);
    assert_eq!(summary.accepted, 12);
    assert_eq!(summary.rejections.total(), 6);
    assert_eq!(summary.profile.negative_delay_rows, 2);
    assert_eq!(summary.output.key, "flight_delays_transformed_single.csv");
    assert_eq!(summary.output.rows, 12);
    assert_eq!(run.reports.len(), ReportKind::ALL.len());
    assert_eq!(summary.reports.len(), ReportKind::ALL.len());
    assert_eq!(
        summary.reports[0].uri,
        "s3://flight-delays-data-bucket/analytics/total_delays_by_airline.csv"
    );

    let transformed = store.get_object(&keys.transformed).await.unwrap();
    let df = read_flights_csv(&transformed).unwrap();
    assert_eq!(df.height(), 12);
    for name in ["IsDelayed", "TimeOfDay", "DelayCategory"] {
        assert!(df.column(name).is_ok(), "missing {name}");
    }

    let report = store
        .get_object("analytics/top_longest_delays.csv")
        .await
        .unwrap();
    let report = read_flights_csv(&report).unwrap();
    assert_eq!(report.height(), 5);

    let json = serde_json::to_value(summary).unwrap();
    assert_eq!(json["rejections"]["invalid_delay_minutes"], 3);
    assert_eq!(json["reports"].as_array().map(Vec::len), Some(10));
}

#[tokio::test]
async fn batch_fails_when_input_is_missing() {
    let store = InMemoryBucketStore::new("flights");
    let err = run_batch(&store, &ObjectKeys::default()).await.unwrap_err();
    assert!(err.to_string().contains("object not found"));
    assert!(store.keys().is_empty());
}
