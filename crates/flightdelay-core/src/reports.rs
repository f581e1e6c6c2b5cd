//! Fixed aggregate queries over the enriched flight dataset.
//!
//! Queries expect `DelayMinutes` as integers, i.e. the output of
//! [`EnrichedFrame::reporting_frame`](crate::columnar::EnrichedFrame::reporting_frame).

use flightdelay_classifier::fields;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

const TOP_N: IdxSize = 5;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{report} needs column {column}")]
    MissingColumn {
        report: &'static str,
        column: &'static str,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    TotalDelaysByAirline,
    AvgDelayByAirline,
    FlightsByTimeOfDay,
    AvgDelayByTimeOfDay,
    CancellationsAndDiversions,
    AvgDelayByCategory,
    FlightsByDelayCategory,
    TopLongestDelays,
    TopOriginAirports,
    DelayedPercentageByAirline,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        ReportKind::TotalDelaysByAirline,
        ReportKind::AvgDelayByAirline,
        ReportKind::FlightsByTimeOfDay,
        ReportKind::AvgDelayByTimeOfDay,
        ReportKind::CancellationsAndDiversions,
        ReportKind::AvgDelayByCategory,
        ReportKind::FlightsByDelayCategory,
        ReportKind::TopLongestDelays,
        ReportKind::TopOriginAirports,
        ReportKind::DelayedPercentageByAirline,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ReportKind::TotalDelaysByAirline => "total_delays_by_airline",
            ReportKind::AvgDelayByAirline => "avg_delay_by_airline",
            ReportKind::FlightsByTimeOfDay => "flights_by_time_of_day",
            ReportKind::AvgDelayByTimeOfDay => "avg_delay_by_time_of_day",
            ReportKind::CancellationsAndDiversions => "cancellations_and_diversions",
            ReportKind::AvgDelayByCategory => "avg_delay_by_category",
            ReportKind::FlightsByDelayCategory => "flights_by_delay_category",
            ReportKind::TopLongestDelays => "top_longest_delays",
            ReportKind::TopOriginAirports => "top_origin_airports",
            ReportKind::DelayedPercentageByAirline => "delayed_percentage_by_airline",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::TotalDelaysByAirline => "Total number of delays by airline",
            ReportKind::AvgDelayByAirline => "Average delay of delayed flights by airline",
            ReportKind::FlightsByTimeOfDay => "Flights by time of day",
            ReportKind::AvgDelayByTimeOfDay => "Average delay of delayed flights by time of day",
            ReportKind::CancellationsAndDiversions => "Cancellations and diversions by airline",
            ReportKind::AvgDelayByCategory => "Average delay by delay category",
            ReportKind::FlightsByDelayCategory => "Flights by delay category",
            ReportKind::TopLongestDelays => "Top 5 longest delays",
            ReportKind::TopOriginAirports => "Top 5 airports by departures",
            ReportKind::DelayedPercentageByAirline => "Percentage of delayed flights by airline",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::TotalDelaysByAirline
            | ReportKind::AvgDelayByAirline
            | ReportKind::DelayedPercentageByAirline => &[
                fields::AIRLINE,
                fields::IS_DELAYED,
                fields::DELAY_MINUTES,
            ],
            ReportKind::FlightsByTimeOfDay => &[fields::TIME_OF_DAY],
            ReportKind::AvgDelayByTimeOfDay => &[
                fields::TIME_OF_DAY,
                fields::IS_DELAYED,
                fields::DELAY_MINUTES,
            ],
            ReportKind::CancellationsAndDiversions => {
                &[fields::AIRLINE, fields::CANCELLED, fields::DIVERTED]
            }
            ReportKind::AvgDelayByCategory => &[fields::DELAY_CATEGORY, fields::DELAY_MINUTES],
            ReportKind::FlightsByDelayCategory => &[fields::DELAY_CATEGORY],
            ReportKind::TopLongestDelays => &[
                fields::FLIGHT_ID,
                fields::AIRLINE,
                fields::ORIGIN,
                fields::DESTINATION,
                fields::DELAY_MINUTES,
            ],
            ReportKind::TopOriginAirports => &[fields::ORIGIN],
        }
    }

    fn query(&self, flights: LazyFrame) -> LazyFrame {
        match self {
            ReportKind::TotalDelaysByAirline => flights
                .filter(delayed())
                .group_by([col(fields::AIRLINE)])
                .agg([len().alias("TotalDelays")])
                .sort(
                    ["TotalDelays", fields::AIRLINE],
                    descending_then_ascending(),
                ),
            ReportKind::AvgDelayByAirline => flights
                .filter(delayed())
                .group_by([col(fields::AIRLINE)])
                .agg([col(fields::DELAY_MINUTES).mean().alias("AvgDelayMinutes")])
                .sort(
                    ["AvgDelayMinutes", fields::AIRLINE],
                    descending_then_ascending(),
                ),
            ReportKind::FlightsByTimeOfDay => flights
                .group_by([col(fields::TIME_OF_DAY)])
                .agg([len().alias("TotalFlights")])
                .sort(
                    ["TotalFlights", fields::TIME_OF_DAY],
                    descending_then_ascending(),
                ),
            ReportKind::AvgDelayByTimeOfDay => flights
                .filter(delayed())
                .group_by([col(fields::TIME_OF_DAY)])
                .agg([col(fields::DELAY_MINUTES).mean().alias("AvgDelay")])
                .sort(
                    ["AvgDelay", fields::TIME_OF_DAY],
                    descending_then_ascending(),
                ),
            ReportKind::CancellationsAndDiversions => flights
                .group_by([col(fields::AIRLINE)])
                .agg([
                    truthy(fields::CANCELLED)
                        .cast(DataType::Int64)
                        .sum()
                        .alias("TotalCancellations"),
                    truthy(fields::DIVERTED)
                        .cast(DataType::Int64)
                        .sum()
                        .alias("TotalDiversions"),
                ])
                .sort(
                    ["TotalCancellations", fields::AIRLINE],
                    descending_then_ascending(),
                ),
            ReportKind::AvgDelayByCategory => flights
                .group_by([col(fields::DELAY_CATEGORY)])
                .agg([col(fields::DELAY_MINUTES).mean().alias("AvgDelayMinutes")])
                .sort(
                    ["AvgDelayMinutes", fields::DELAY_CATEGORY],
                    descending_then_ascending(),
                ),
            ReportKind::FlightsByDelayCategory => flights
                .group_by([col(fields::DELAY_CATEGORY)])
                .agg([len().alias("TotalFlights")])
                .sort(
                    ["TotalFlights", fields::DELAY_CATEGORY],
                    descending_then_ascending(),
                ),
            ReportKind::TopLongestDelays => flights
                .select([
                    col(fields::FLIGHT_ID),
                    col(fields::AIRLINE),
                    col(fields::ORIGIN),
                    col(fields::DESTINATION),
                    col(fields::DELAY_MINUTES),
                ])
                .sort(
                    [fields::DELAY_MINUTES, fields::FLIGHT_ID],
                    descending_then_ascending(),
                )
                .limit(TOP_N),
            ReportKind::TopOriginAirports => flights
                .group_by([col(fields::ORIGIN)])
                .agg([len().alias("TotalDepartures")])
                .sort(
                    ["TotalDepartures", fields::ORIGIN],
                    descending_then_ascending(),
                )
                .limit(TOP_N),
            ReportKind::DelayedPercentageByAirline => flights
                .group_by([col(fields::AIRLINE)])
                .agg([
                    (col(fields::IS_DELAYED).cast(DataType::Float64).mean() * lit(100.0))
                        .alias("DelayedPercentage"),
                ])
                .sort(
                    ["DelayedPercentage", fields::AIRLINE],
                    descending_then_ascending(),
                ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub kind: ReportKind,
    pub frame: DataFrame,
}

pub fn run_report(flights: &DataFrame, kind: ReportKind) -> Result<DataFrame, ReportError> {
    for &column in kind.required_columns() {
        if flights.column(column).is_err() {
            return Err(ReportError::MissingColumn {
                report: kind.code(),
                column,
            });
        }
    }
    Ok(kind.query(flights.clone().lazy()).collect()?)
}

/// Runs each report in order; reports whose input columns are absent are skipped.
pub fn run_reports(
    flights: &DataFrame,
    kinds: &[ReportKind],
) -> Result<Vec<ReportOutput>, ReportError> {
    let mut outputs = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        match run_report(flights, kind) {
            Ok(frame) => outputs.push(ReportOutput { kind, frame }),
            Err(err @ ReportError::MissingColumn { .. }) => {
                warn!(report = kind.code(), error = %err, "skipping report");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(outputs)
}

fn delayed() -> Expr {
    col(fields::IS_DELAYED).eq(lit(true))
}

/// `true`, `1` or `yes` in any case.
fn truthy(name: &str) -> Expr {
    let value = col(name).cast(DataType::String).str().to_lowercase();
    value
        .clone()
        .eq(lit("true"))
        .or(value.clone().eq(lit("1")))
        .or(value.eq(lit("yes")))
}

fn descending_then_ascending() -> SortMultipleOptions {
    SortMultipleOptions::default()
        .with_order_descending_multi([true, false])
        .with_nulls_last(true)
}
