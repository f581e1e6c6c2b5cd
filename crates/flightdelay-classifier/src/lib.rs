pub mod classify;
pub mod errors;
pub mod model;

pub use classify::{classify, classify_fields, departure_hour, DATE_TIME_SEPARATOR};
pub use errors::RejectReason;
pub use model::{
    fields, Classification, DelayCategory, DerivedFields, EnrichedFlightRecord, FlightRecord,
    Rejection, TimeOfDay,
};
