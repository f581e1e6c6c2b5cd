//! Rules that turn a raw flight row into an enriched one.
//!
//! [`classify_fields`] holds every threshold and is the only place the
//! derivation lives; the record path and the columnar path both go through it.

use crate::errors::RejectReason;
use crate::model::{
    fields, Classification, DelayCategory, DerivedFields, FlightRecord, Rejection, TimeOfDay,
};

pub const DATE_TIME_SEPARATOR: char = 'T';

pub fn classify(record: FlightRecord) -> Classification {
    let outcome = classify_fields(
        record.get(fields::SCHEDULED_DEPARTURE),
        record.get(fields::DELAY_MINUTES),
    );

    match outcome {
        Ok(derived) => Classification::Accepted(derived.apply(record)),
        Err(reason) => Classification::Rejected(Rejection { reason, record }),
    }
}

/// Validates the departure and delay strings and derives the categorical fields.
///
/// Checks run in order and stop at the first failure: blank departure, missing
/// separator, non-digit delay (a leading `-` fails here), integer overflow, then
/// an unreadable hour.
pub fn classify_fields(
    departure: Option<&str>,
    delay_minutes: Option<&str>,
) -> Result<DerivedFields, RejectReason> {
    let departure = departure.unwrap_or_default().trim();
    if departure.is_empty() {
        return Err(RejectReason::MissingDeparture);
    }
    if !departure.contains(DATE_TIME_SEPARATOR) {
        return Err(RejectReason::MissingDateTimeSeparator {
            value: departure.to_string(),
        });
    }

    let raw_delay = delay_minutes.unwrap_or_default().trim();
    if raw_delay.is_empty() || !raw_delay.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(RejectReason::InvalidDelayMinutes {
            value: raw_delay.to_string(),
        });
    }
    let delay_minutes: i64 = raw_delay
        .parse()
        .map_err(|_| RejectReason::DelayMinutesOutOfRange {
            value: raw_delay.to_string(),
        })?;

    let hour = departure_hour(departure)?;

    Ok(DerivedFields {
        delay_minutes,
        is_delayed: delay_minutes > 0,
        time_of_day: TimeOfDay::from_hour(hour),
        delay_category: DelayCategory::from_minutes(delay_minutes),
    })
}

/// Reads the hour from the first two characters after the first separator,
/// stopping at a second separator if one is present.
pub fn departure_hour(departure: &str) -> Result<i64, RejectReason> {
    let time = departure.split(DATE_TIME_SEPARATOR).nth(1).unwrap_or_default();
    let prefix: String = time.chars().take(2).collect();
    prefix
        .trim()
        .parse::<i64>()
        .map_err(|_| RejectReason::MalformedHour {
            value: departure.to_string(),
        })
}
