//! `pdtlog` - Aircraft, pilot and PDT flight-log records
//!
//! This library keeps the fleet, the pilot roster and the daily flight-log
//! (PDT) pages of a general-aviation operator in SQLite. It derives flight
//! times from departure and landing clock times and classifies expiry dates
//! into urgency bands.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod storage;
mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
