use flightdelay_classifier::fields;
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
}

/// Exploratory counts taken from the raw dataset before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub negative_delay_rows: usize,
    pub negative_delay_with_reason: usize,
    pub missing_values: Vec<ColumnMissing>,
}

impl DatasetProfile {
    pub fn negative_delays_have_no_reason(&self) -> bool {
        self.negative_delay_with_reason == 0
    }
}

/// Profiles `df`. Missing counts are taken after `DelayReason` would be set
/// to "On Time" for rows with a delay of zero or less, so those rows never
/// count as missing a reason.
pub fn profile_frame(df: &DataFrame) -> PolarsResult<DatasetProfile> {
    let total_rows = df.height();

    let delays: Vec<Option<i64>> = match df.column(fields::DELAY_MINUTES) {
        Ok(column) => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|value| value.and_then(|text| text.trim().parse::<i64>().ok()))
            .collect(),
        Err(_) => vec![None; total_rows],
    };
    let filled_on_time = |idx: usize| delays[idx].is_some_and(|value| value <= 0);

    let mut negative_delay_rows = 0;
    let mut negative_delay_with_reason = 0;
    let reasons = match df.column(fields::DELAY_REASON) {
        Ok(column) => Some(column.cast(&DataType::String)?),
        Err(_) => None,
    };
    let reasons = reasons.as_ref().map(|column| column.str()).transpose()?;
    for (idx, delay) in delays.iter().enumerate() {
        if !delay.is_some_and(|value| value < 0) {
            continue;
        }
        negative_delay_rows += 1;
        let has_reason = reasons
            .and_then(|reasons| reasons.get(idx))
            .is_some_and(|reason| !reason.trim().is_empty());
        if has_reason {
            negative_delay_with_reason += 1;
        }
    }

    let mut missing_values = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let is_reason = column.name().as_str() == fields::DELAY_REASON;
        let missing = match column.dtype() {
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .filter(|(idx, value)| {
                    value.is_none_or(|text| text.trim().is_empty())
                        && !(is_reason && filled_on_time(*idx))
                })
                .count(),
            _ => column
                .as_materialized_series()
                .is_null()
                .into_iter()
                .enumerate()
                .filter(|(idx, null)| {
                    null.unwrap_or(false) && !(is_reason && filled_on_time(*idx))
                })
                .count(),
        };
        missing_values.push(ColumnMissing {
            column: column.name().to_string(),
            missing,
        });
    }

    Ok(DatasetProfile {
        total_rows,
        negative_delay_rows,
        negative_delay_with_reason,
        missing_values,
    })
}
