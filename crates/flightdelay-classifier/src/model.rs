use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::RejectReason;

/// Column names shared by the raw and enriched flight datasets.
pub mod fields {
    pub const SCHEDULED_DEPARTURE: &str = "ScheduledDeparture";
    pub const DELAY_MINUTES: &str = "DelayMinutes";
    pub const DELAY_REASON: &str = "DelayReason";

    pub const IS_DELAYED: &str = "IsDelayed";
    pub const TIME_OF_DAY: &str = "TimeOfDay";
    pub const DELAY_CATEGORY: &str = "DelayCategory";

    pub const FLIGHT_ID: &str = "FlightID";
    pub const AIRLINE: &str = "Airline";
    pub const ORIGIN: &str = "Origin";
    pub const DESTINATION: &str = "Destination";
    pub const CANCELLED: &str = "Cancelled";
    pub const DIVERTED: &str = "Diverted";

    /// Derived columns in the order they are appended to the output.
    pub const DERIVED: [&str; 3] = [IS_DELAYED, TIME_OF_DAY, DELAY_CATEGORY];

    /// Replacement reason written for flights that left on time.
    pub const ON_TIME_REASON: &str = "On Time";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Buckets a departure hour. Anything outside `[5, 21)` is night, including
    /// hours a malformed clock might report outside `[0, 24)`.
    pub fn from_hour(hour: i64) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DelayCategory {
    #[serde(rename = "On Time")]
    OnTime,
    #[serde(rename = "Short Delay")]
    ShortDelay,
    #[serde(rename = "Moderate Delay")]
    ModerateDelay,
    #[serde(rename = "Long Delay")]
    LongDelay,
}

impl DelayCategory {
    pub const ALL: [DelayCategory; 4] = [
        DelayCategory::OnTime,
        DelayCategory::ShortDelay,
        DelayCategory::ModerateDelay,
        DelayCategory::LongDelay,
    ];

    pub const SHORT_DELAY_MAX_MINUTES: i64 = 15;
    pub const MODERATE_DELAY_MAX_MINUTES: i64 = 60;

    pub fn from_minutes(minutes: i64) -> Self {
        if minutes <= 0 {
            DelayCategory::OnTime
        } else if minutes <= Self::SHORT_DELAY_MAX_MINUTES {
            DelayCategory::ShortDelay
        } else if minutes <= Self::MODERATE_DELAY_MAX_MINUTES {
            DelayCategory::ModerateDelay
        } else {
            DelayCategory::LongDelay
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayCategory::OnTime => "On Time",
            DelayCategory::ShortDelay => "Short Delay",
            DelayCategory::ModerateDelay => "Moderate Delay",
            DelayCategory::LongDelay => "Long Delay",
        }
    }
}

impl fmt::Display for DelayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw flight row: named string fields in source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightRecord {
    fields: Vec<(String, String)>,
}

impl FlightRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.set(name, value);
        }
        record
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the value in place when the field exists, otherwise appends it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FlightRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Values derived from the departure time and delay of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedFields {
    pub delay_minutes: i64,
    pub is_delayed: bool,
    pub time_of_day: TimeOfDay,
    pub delay_category: DelayCategory,
}

impl DerivedFields {
    /// Whether `DelayReason` is replaced with [`fields::ON_TIME_REASON`].
    pub fn overrides_reason(&self) -> bool {
        self.delay_minutes <= 0
    }

    pub fn apply(self, mut record: FlightRecord) -> EnrichedFlightRecord {
        if self.overrides_reason() {
            record.set(fields::DELAY_REASON, fields::ON_TIME_REASON);
        }
        EnrichedFlightRecord {
            record,
            derived: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedFlightRecord {
    pub record: FlightRecord,
    pub derived: DerivedFields,
}

impl EnrichedFlightRecord {
    pub fn is_delayed(&self) -> bool {
        self.derived.is_delayed
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.derived.time_of_day
    }

    pub fn delay_category(&self) -> DelayCategory {
        self.derived.delay_category
    }

    pub fn delay_minutes(&self) -> i64 {
        self.derived.delay_minutes
    }

    pub fn delay_reason(&self) -> Option<&str> {
        self.record.get(fields::DELAY_REASON)
    }

    /// Looks up a source or derived column. `IsDelayed` renders as `True`/`False`.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::IS_DELAYED => Some(if self.derived.is_delayed {
                "True"
            } else {
                "False"
            }),
            fields::TIME_OF_DAY => Some(self.derived.time_of_day.as_str()),
            fields::DELAY_CATEGORY => Some(self.derived.delay_category.as_str()),
            other => self.record.get(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub record: FlightRecord,
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accepted(EnrichedFlightRecord),
    Rejected(Rejection),
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted(_))
    }

    pub fn accepted(self) -> Option<EnrichedFlightRecord> {
        match self {
            Classification::Accepted(enriched) => Some(enriched),
            Classification::Rejected(_) => None,
        }
    }

    pub fn into_result(self) -> Result<EnrichedFlightRecord, Rejection> {
        match self {
            Classification::Accepted(enriched) => Ok(enriched),
            Classification::Rejected(rejection) => Err(rejection),
        }
    }
}
