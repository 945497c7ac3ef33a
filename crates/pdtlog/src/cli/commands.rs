//! CLI command definitions.
//!
//! Argument structs for every subcommand, plus the conversions from parsed
//! arguments into records.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveTime};
use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::compute::{parse_duration, FlightHours};
use crate::model::{Aircraft, FlightOperation, PdtPage, Pilot};

/// Value name shown for `--op`.
const OPERATION_FORMAT: &str = "PILOT,HH:MM,FROM,HH:MM,TO,LANDINGS,ENGINE_HOURS[,FLIGHT_TIME]";

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Compute urgency bands as of this date instead of today
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub today: Option<NaiveDate>,
}

/// Options shared by `list` and `show` subcommands.
#[derive(Debug, Clone, Args)]
pub struct DisplayArgs {
    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Compute urgency bands as of this date instead of today
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub today: Option<NaiveDate>,
}

/// Aircraft commands.
#[derive(Debug, Subcommand)]
pub enum AircraftCommand {
    /// Register a new aircraft
    Add(AddAircraft),

    /// Change fields of an existing aircraft
    Edit(EditAircraft),

    /// List aircraft with their expiry bands
    List {
        /// Include inactive aircraft
        #[arg(short, long)]
        all: bool,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Show one aircraft with totals and recent operations
    Show {
        /// Aircraft id
        id: i64,

        #[command(flatten)]
        display: DisplayArgs,
    },
}

/// Arguments for `aircraft add`.
#[derive(Debug, Args)]
pub struct AddAircraft {
    /// Manufacturer, e.g. Cessna
    #[arg(long)]
    pub manufacturer: String,

    /// Model designation, e.g. 172S
    #[arg(long = "type", value_name = "TYPE")]
    pub aircraft_type: String,

    /// Manufacturer serial number
    #[arg(long = "serial")]
    pub serial_number: String,

    /// Registration marks, e.g. SP-ABC
    #[arg(long = "registration")]
    pub registration_marks: String,

    /// Airframe hours before the first logged flight (GGG.MM)
    #[arg(long, value_name = "GGG.MM", value_parser = parse_hours, default_value = "0.00")]
    pub base_hours: FlightHours,

    /// Landings before the first logged flight
    #[arg(long, default_value_t = 0)]
    pub base_landings: u32,

    /// Next scheduled maintenance date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub next_service_date: Option<NaiveDate>,

    /// Airframe hours at which the next maintenance is due (GGG.MM)
    #[arg(long, value_name = "GGG.MM", value_parser = parse_hours)]
    pub next_service_hours: Option<FlightHours>,

    /// ARC expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub arc_until: Option<NaiveDate>,

    /// Insurance expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub insurance_until: Option<NaiveDate>,

    /// Register the aircraft as inactive
    #[arg(long)]
    pub inactive: bool,
}

impl AddAircraft {
    /// Build the aircraft record.
    #[must_use]
    pub fn into_aircraft(self) -> Aircraft {
        Aircraft {
            base_flight_hours: self.base_hours,
            base_landings: self.base_landings,
            next_service_date: self.next_service_date,
            next_service_hours: self.next_service_hours,
            arc_valid_until: self.arc_until,
            insurance_valid_until: self.insurance_until,
            is_active: !self.inactive,
            ..Aircraft::new(
                self.manufacturer,
                self.aircraft_type,
                self.serial_number,
                self.registration_marks,
            )
        }
    }
}

/// Arguments for `aircraft edit`. Only the given fields change.
#[derive(Debug, Args)]
pub struct EditAircraft {
    /// Aircraft id
    pub id: i64,

    /// Manufacturer
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Model designation
    #[arg(long = "type", value_name = "TYPE")]
    pub aircraft_type: Option<String>,

    /// Manufacturer serial number
    #[arg(long = "serial")]
    pub serial_number: Option<String>,

    /// Registration marks
    #[arg(long = "registration")]
    pub registration_marks: Option<String>,

    /// Airframe hours before the first logged flight (GGG.MM)
    #[arg(long, value_name = "GGG.MM", value_parser = parse_hours)]
    pub base_hours: Option<FlightHours>,

    /// Landings before the first logged flight
    #[arg(long)]
    pub base_landings: Option<u32>,

    /// Next scheduled maintenance date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub next_service_date: Option<NaiveDate>,

    /// Airframe hours at which the next maintenance is due (GGG.MM)
    #[arg(long, value_name = "GGG.MM", value_parser = parse_hours)]
    pub next_service_hours: Option<FlightHours>,

    /// ARC expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub arc_until: Option<NaiveDate>,

    /// Insurance expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub insurance_until: Option<NaiveDate>,

    /// Mark the aircraft active or inactive
    #[arg(long, value_name = "BOOL")]
    pub active: Option<bool>,
}

impl EditAircraft {
    /// Copy the given fields onto `aircraft`.
    pub fn apply(self, aircraft: &mut Aircraft) {
        if let Some(v) = self.manufacturer {
            aircraft.manufacturer = v;
        }
        if let Some(v) = self.aircraft_type {
            aircraft.aircraft_type = v;
        }
        if let Some(v) = self.serial_number {
            aircraft.serial_number = v;
        }
        if let Some(v) = self.registration_marks {
            aircraft.registration_marks = v;
        }
        if let Some(v) = self.base_hours {
            aircraft.base_flight_hours = v;
        }
        if let Some(v) = self.base_landings {
            aircraft.base_landings = v;
        }
        if self.next_service_date.is_some() {
            aircraft.next_service_date = self.next_service_date;
        }
        if self.next_service_hours.is_some() {
            aircraft.next_service_hours = self.next_service_hours;
        }
        if self.arc_until.is_some() {
            aircraft.arc_valid_until = self.arc_until;
        }
        if self.insurance_until.is_some() {
            aircraft.insurance_valid_until = self.insurance_until;
        }
        if let Some(v) = self.active {
            aircraft.is_active = v;
        }
    }
}

/// Pilot commands.
#[derive(Debug, Subcommand)]
pub enum PilotCommand {
    /// Register a new pilot
    Add(AddPilot),

    /// Change fields of an existing pilot
    Edit(EditPilot),

    /// List pilots with their expiry bands
    List {
        /// Include inactive pilots
        #[arg(short, long)]
        all: bool,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Show one pilot with totals and recent operations
    Show {
        /// Pilot id
        id: i64,

        #[command(flatten)]
        display: DisplayArgs,
    },
}

/// Arguments for `pilot add`.
#[derive(Debug, Args)]
pub struct AddPilot {
    /// Given name
    #[arg(long)]
    pub first_name: String,

    /// Family name
    #[arg(long)]
    pub last_name: String,

    /// Account name
    #[arg(long)]
    pub username: String,

    /// Licence number, e.g. PL.FCL.42752.PPL(A)
    #[arg(long = "license")]
    pub license_number: String,

    /// Contact phone number
    #[arg(long = "phone")]
    pub phone_number: String,

    /// Contact e-mail
    #[arg(long)]
    pub email: Option<String>,

    /// SEP(L) rating expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub sepl_until: Option<NaiveDate>,

    /// Medical certificate expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub medical_until: Option<NaiveDate>,

    /// Register the pilot as inactive
    #[arg(long)]
    pub inactive: bool,
}

impl AddPilot {
    /// Build the pilot record.
    #[must_use]
    pub fn into_pilot(self) -> Pilot {
        Pilot {
            email: self.email,
            sepl_valid_until: self.sepl_until,
            medical_valid_until: self.medical_until,
            is_active: !self.inactive,
            ..Pilot::new(
                self.first_name,
                self.last_name,
                self.username,
                self.license_number,
                self.phone_number,
            )
        }
    }
}

/// Arguments for `pilot edit`. Only the given fields change.
#[derive(Debug, Args)]
pub struct EditPilot {
    /// Pilot id
    pub id: i64,

    /// Given name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Family name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Account name
    #[arg(long)]
    pub username: Option<String>,

    /// Licence number
    #[arg(long = "license")]
    pub license_number: Option<String>,

    /// Contact phone number
    #[arg(long = "phone")]
    pub phone_number: Option<String>,

    /// Contact e-mail; an empty value clears it
    #[arg(long)]
    pub email: Option<String>,

    /// SEP(L) rating expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub sepl_until: Option<NaiveDate>,

    /// Medical certificate expiry date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub medical_until: Option<NaiveDate>,

    /// Mark the pilot active or inactive
    #[arg(long, value_name = "BOOL")]
    pub active: Option<bool>,
}

impl EditPilot {
    /// Copy the given fields onto `pilot`.
    pub fn apply(self, pilot: &mut Pilot) {
        if let Some(v) = self.first_name {
            pilot.first_name = v;
        }
        if let Some(v) = self.last_name {
            pilot.last_name = v;
        }
        if let Some(v) = self.username {
            pilot.username = v;
        }
        if let Some(v) = self.license_number {
            pilot.license_number = v;
        }
        if let Some(v) = self.phone_number {
            pilot.phone_number = v;
        }
        if let Some(v) = self.email {
            pilot.email = Some(v).filter(|e| !e.is_empty());
        }
        if self.sepl_until.is_some() {
            pilot.sepl_valid_until = self.sepl_until;
        }
        if self.medical_until.is_some() {
            pilot.medical_valid_until = self.medical_until;
        }
        if let Some(v) = self.active {
            pilot.is_active = v;
        }
    }
}

/// PDT page commands.
#[derive(Debug, Subcommand)]
pub enum PdtCommand {
    /// Log a new PDT page with its flight operations
    Add(AddPage),

    /// Change a PDT page; any --op replaces all of its operations
    Edit(EditPage),

    /// List PDT pages, newest first
    List {
        /// Only pages of this aircraft id
        #[arg(long)]
        aircraft: Option<i64>,

        /// Only pages dated on or after this day
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Only pages dated on or before this day
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        to: Option<NaiveDate>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show one PDT page with its operations
    Show {
        /// Page id
        id: i64,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

/// Arguments for `pdt add`.
#[derive(Debug, Args)]
pub struct AddPage {
    /// Aircraft id
    #[arg(long)]
    pub aircraft: i64,

    /// Date written on the page
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: NaiveDate,

    /// Page number, unique per aircraft
    #[arg(long = "page")]
    pub page_number: String,

    /// Persons on board
    #[arg(long = "pob", default_value_t = 1)]
    pub persons_on_board: u16,

    /// Fuel added, litres
    #[arg(long, default_value_t = 0.0)]
    pub fuel_added: f64,

    /// Fuel at start, litres
    #[arg(long, default_value_t = 0.0)]
    pub fuel_at_start: f64,

    /// Oil added, litres
    #[arg(long, default_value_t = 0.0)]
    pub oil_added: f64,

    /// Oil at start, litres
    #[arg(long, default_value_t = 0.0)]
    pub oil_at_start: f64,

    /// Remarks after the last operation
    #[arg(long, default_value = "")]
    pub notes: String,

    /// A flight operation; repeat for each leg
    #[arg(long = "op", value_name = OPERATION_FORMAT, value_parser = parse_operation, required = true)]
    pub operations: Vec<FlightOperation>,
}

impl AddPage {
    /// Split into the page header and its operations.
    #[must_use]
    pub fn into_parts(self) -> (PdtPage, Vec<FlightOperation>) {
        let page = PdtPage {
            fuel_added: self.fuel_added,
            fuel_at_start: self.fuel_at_start,
            oil_added: self.oil_added,
            oil_at_start: self.oil_at_start,
            last_operation_notes: self.notes,
            ..PdtPage::new(
                self.aircraft,
                self.date,
                self.page_number,
                self.persons_on_board,
            )
        };
        (page, self.operations)
    }
}

/// Arguments for `pdt edit`. Only the given fields change.
#[derive(Debug, Args)]
pub struct EditPage {
    /// Page id
    pub id: i64,

    /// Move the page to this aircraft id
    #[arg(long)]
    pub aircraft: Option<i64>,

    /// Date written on the page
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Page number
    #[arg(long = "page")]
    pub page_number: Option<String>,

    /// Persons on board
    #[arg(long = "pob")]
    pub persons_on_board: Option<u16>,

    /// Fuel added, litres
    #[arg(long)]
    pub fuel_added: Option<f64>,

    /// Fuel at start, litres
    #[arg(long)]
    pub fuel_at_start: Option<f64>,

    /// Oil added, litres
    #[arg(long)]
    pub oil_added: Option<f64>,

    /// Oil at start, litres
    #[arg(long)]
    pub oil_at_start: Option<f64>,

    /// Remarks after the last operation
    #[arg(long)]
    pub notes: Option<String>,

    /// Replacement flight operations; repeat for each leg
    #[arg(long = "op", value_name = OPERATION_FORMAT, value_parser = parse_operation)]
    pub operations: Vec<FlightOperation>,
}

impl EditPage {
    /// Copy the given header fields onto `page` and return the replacement
    /// operations, if any were given.
    #[must_use]
    pub fn apply(self, page: &mut PdtPage) -> Option<Vec<FlightOperation>> {
        if let Some(v) = self.aircraft {
            page.aircraft_id = v;
        }
        if let Some(v) = self.date {
            page.pdt_date = v;
        }
        if let Some(v) = self.page_number {
            page.page_number = v;
        }
        if let Some(v) = self.persons_on_board {
            page.persons_on_board = v;
        }
        if let Some(v) = self.fuel_added {
            page.fuel_added = v;
        }
        if let Some(v) = self.fuel_at_start {
            page.fuel_at_start = v;
        }
        if let Some(v) = self.oil_added {
            page.oil_added = v;
        }
        if let Some(v) = self.oil_at_start {
            page.oil_at_start = v;
        }
        if let Some(v) = self.notes {
            page.last_operation_notes = v;
        }
        (!self.operations.is_empty()).then_some(self.operations)
    }
}

/// Direct access to the flight-time and expiry computations.
#[derive(Debug, Subcommand)]
pub enum CalcCommand {
    /// Flight time between two clock times, wrapping past midnight
    FlightTime {
        /// Take-off time
        #[arg(long, value_name = "HH:MM", value_parser = parse_clock_time)]
        departure: NaiveTime,

        /// Landing time
        #[arg(long, value_name = "HH:MM", value_parser = parse_clock_time)]
        landing: NaiveTime,
    },

    /// Urgency band of an expiry date
    Expiry {
        /// Expiry date; omit for an untracked date
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Reference date instead of today
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Parse a `YYYY-MM-DD` date.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{s}': {e}"))
}

/// Parse an `HH:MM` or `HH:MM:SS` clock time.
fn parse_clock_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got '{s}'"))
}

fn parse_hours(s: &str) -> Result<FlightHours, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

/// Parse one `--op` value into a flight operation.
fn parse_operation(s: &str) -> Result<FlightOperation, String> {
    let fields: Vec<&str> = s.split(',').map(str::trim).collect();
    let [pilot, departure, from, landing, to, landings, engine_hours, rest @ ..] =
        fields.as_slice()
    else {
        return Err(format!("expected {OPERATION_FORMAT}, got '{s}'"));
    };
    let flight_time: Option<Duration> = match rest {
        [] => None,
        [time] => Some(parse_duration(time).map_err(|e| e.to_string())?),
        _ => return Err(format!("too many fields in '{s}'")),
    };

    let pilot_id = pilot
        .parse()
        .map_err(|_| format!("pilot must be a numeric id, got '{pilot}'"))?;
    let mut operation = FlightOperation::new(
        pilot_id,
        parse_clock_time(departure)?,
        *from,
        parse_clock_time(landing)?,
        *to,
    );
    operation.number_of_landings = landings
        .parse()
        .map_err(|_| format!("landings must be a whole number, got '{landings}'"))?;
    operation.engine_hours_after_flight = engine_hours
        .parse()
        .map_err(|_| format!("engine hours must be a number, got '{engine_hours}'"))?;
    operation.flight_time = flight_time;
    Ok(operation)
}
