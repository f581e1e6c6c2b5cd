//! Whole-dataset path: profile, enrich, publish, then run the reports.

use chrono::{DateTime, Utc};
use flightdelay_bucket::BucketStore;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::columnar::{enrich_frame, read_flights_csv};
use crate::config::ObjectKeys;
use crate::error::Result;
use crate::ingestion::compute_hash;
use crate::outputs::{publish_frame, report_key, PublishedObject};
use crate::profile::{profile_frame, DatasetProfile};
use crate::reports::{run_reports, ReportKind, ReportOutput};
use crate::tally::RejectionTally;

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_uri: String,
    pub input_hash: String,
    pub profile: DatasetProfile,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejections: RejectionTally,
    pub output: PublishedObject,
    pub reports: Vec<PublishedObject>,
}

#[derive(Debug, Clone)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub reports: Vec<ReportOutput>,
}

pub async fn run_batch(store: &dyn BucketStore, keys: &ObjectKeys) -> Result<BatchRun> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let input_uri = store.object_uri(&keys.raw);
    info!(%run_id, input = %input_uri, "loading flight dataset");

    let contents = store.get_object(&keys.raw).await?;
    let input_hash = compute_hash(&contents);
    let raw = read_flights_csv(&contents)?;

    let profile = profile_frame(&raw)?;
    info!(
        %run_id,
        rows = profile.total_rows,
        negative_delays = profile.negative_delay_rows,
        negative_delays_with_reason = profile.negative_delay_with_reason,
        "profiled raw dataset"
    );
    if !profile.negative_delays_have_no_reason() {
        warn!(
            %run_id,
            count = profile.negative_delay_with_reason,
            "some rows with negative DelayMinutes carry a DelayReason"
        );
    }

    let enriched = enrich_frame(&raw)?;
    info!(
        %run_id,
        accepted = enriched.frame.height(),
        rejected = enriched.rejections.total(),
        "enriched flight dataset"
    );

    let output = publish_frame(store, &keys.transformed, &enriched.frame).await?;

    let reporting = enriched.reporting_frame()?;
    let reports = run_reports(&reporting, &ReportKind::ALL)?;
    let mut published_reports = Vec::with_capacity(reports.len());
    for report in &reports {
        let key = report_key(&keys.reports_prefix, report.kind);
        published_reports.push(publish_frame(store, &key, &report.frame).await?);
    }

    let summary = BatchSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        input_uri,
        input_hash,
        profile,
        rows_read: enriched.rows_read,
        accepted: enriched.frame.height(),
        rejections: enriched.rejections,
        output,
        reports: published_reports,
    };
    info!(%run_id, reports = summary.reports.len(), "batch run finished");

    Ok(BatchRun { summary, reports })
}
