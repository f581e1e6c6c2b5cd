use thiserror::Error;

/// Why a single flight record was dropped by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("ScheduledDeparture is missing or blank")]
    MissingDeparture,

    #[error("ScheduledDeparture '{value}' has no date/time separator")]
    MissingDateTimeSeparator { value: String },

    #[error("DelayMinutes '{value}' is not a non-negative integer")]
    InvalidDelayMinutes { value: String },

    #[error("DelayMinutes '{value}' does not fit in a 64-bit integer")]
    DelayMinutesOutOfRange { value: String },

    #[error("ScheduledDeparture '{value}' has no readable hour")]
    MalformedHour { value: String },
}

impl RejectReason {
    /// Stable identifier used when tallying rejections.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingDeparture => "missing_departure",
            RejectReason::MissingDateTimeSeparator { .. } => "missing_date_time_separator",
            RejectReason::InvalidDelayMinutes { .. } => "invalid_delay_minutes",
            RejectReason::DelayMinutesOutOfRange { .. } => "delay_minutes_out_of_range",
            RejectReason::MalformedHour { .. } => "malformed_hour",
        }
    }
}
