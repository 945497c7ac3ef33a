//! Flight-record computations.
//!
//! Pure functions over plain values: flight time from departure and landing
//! clock times, urgency bands for expiry dates, and the `GGG.MM` hours
//! notation. Nothing here reads the clock or touches storage; callers pass
//! "today" explicitly.

mod expiry;
mod flight_time;
mod hours;

pub use expiry::{classify_expiry, ExpiryThresholds, UrgencyBand};
pub use flight_time::{flight_time, resolve_flight_time};
pub use hours::{format_duration, parse_duration, FlightHours};
