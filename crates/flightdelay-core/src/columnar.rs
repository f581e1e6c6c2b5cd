use std::io::Cursor;

use flightdelay_classifier::{classify_fields, fields};
use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::tally::RejectionTally;

/// Accepted rows of a dataset with the derived columns attached.
#[derive(Debug, Clone)]
pub struct EnrichedFrame {
    pub frame: DataFrame,
    /// Parsed `DelayMinutes`, aligned with `frame`.
    pub delay_minutes: Series,
    pub rows_read: usize,
    pub rejections: RejectionTally,
}

impl EnrichedFrame {
    /// The enriched frame with `DelayMinutes` swapped for its integer values.
    pub fn reporting_frame(&self) -> PolarsResult<DataFrame> {
        let mut frame = self.frame.clone();
        frame.with_column(self.delay_minutes.clone())?;
        Ok(frame)
    }
}

/// Loads a headed CSV with every column kept as text. Values past the last
/// header column are dropped.
pub fn read_flights_csv(contents: &[u8]) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(contents.to_vec()))
        .finish()
}

/// Classifies every row of `df`, overwrites `DelayReason`, appends `IsDelayed`,
/// `TimeOfDay` and `DelayCategory`, and drops rejected rows.
pub fn enrich_frame(df: &DataFrame) -> Result<EnrichedFrame> {
    let len = df.height();

    let departure = string_column(df, fields::SCHEDULED_DEPARTURE)?;
    let delay = string_column(df, fields::DELAY_MINUTES)?;
    let existing_reason = string_column(df, fields::DELAY_REASON)?;

    let mut keep = Vec::with_capacity(len);
    let mut minutes: Vec<Option<i64>> = Vec::with_capacity(len);
    let mut reasons: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut is_delayed: Vec<Option<bool>> = Vec::with_capacity(len);
    let mut time_of_day: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut categories: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut rejections = RejectionTally::default();

    for idx in 0..len {
        match classify_fields(departure.get(idx), delay.get(idx)) {
            Ok(derived) => {
                keep.push(true);
                minutes.push(Some(derived.delay_minutes));
                reasons.push(if derived.overrides_reason() {
                    Some(fields::ON_TIME_REASON)
                } else {
                    existing_reason.get(idx)
                });
                is_delayed.push(Some(derived.is_delayed));
                time_of_day.push(Some(derived.time_of_day.as_str()));
                categories.push(Some(derived.delay_category.as_str()));
            }
            Err(reason) => {
                debug!(row = idx, reason = %reason, "dropping flight row");
                rejections.record(&reason);
                keep.push(false);
                minutes.push(None);
                reasons.push(existing_reason.get(idx));
                is_delayed.push(None);
                time_of_day.push(None);
                categories.push(None);
            }
        }
    }

    let mut output = df.clone();
    output.with_column(Series::new(fields::DELAY_REASON.into(), reasons))?;
    output.with_column(Series::new(fields::IS_DELAYED.into(), is_delayed))?;
    output.with_column(Series::new(fields::TIME_OF_DAY.into(), time_of_day))?;
    output.with_column(Series::new(fields::DELAY_CATEGORY.into(), categories))?;

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let frame = output.filter(&mask)?;
    let delay_minutes = Series::new(fields::DELAY_MINUTES.into(), minutes).filter(&mask)?;

    Ok(EnrichedFrame {
        frame,
        delay_minutes,
        rows_read: len,
        rejections,
    })
}

/// A column as text; absent columns read as all-null.
fn string_column(df: &DataFrame, name: &str) -> PolarsResult<StringChunked> {
    match df.column(name) {
        Ok(column) => Ok(column.cast(&DataType::String)?.str()?.clone()),
        Err(_) => Ok(StringChunked::full_null(name.into(), df.height())),
    }
}
