//! Record types: aircraft, pilots, PDT pages and flight operations.
//!
//! Records carry an `id` of `None` until the storage layer assigns one.
//! Each record knows how to validate itself and which computations apply
//! to it; the computations themselves live in [`crate::compute`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compute::{resolve_flight_time, ExpiryThresholds, FlightHours, UrgencyBand};
use crate::error::{Error, Result};
use crate::validate;

/// An aircraft operated by the organisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    /// Storage identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Manufacturer, e.g. `Cessna`.
    pub manufacturer: String,
    /// Model designation, e.g. `172S`.
    pub aircraft_type: String,
    /// Manufacturer serial number. Unique.
    pub serial_number: String,
    /// Registration marks, upper-case. Unique.
    pub registration_marks: String,
    /// Airframe hours before the first logged operation.
    pub base_flight_hours: FlightHours,
    /// Landings before the first logged operation.
    pub base_landings: u32,
    /// Date of the next scheduled maintenance.
    pub next_service_date: Option<NaiveDate>,
    /// Airframe hours at which the next maintenance is due.
    pub next_service_hours: Option<FlightHours>,
    /// Airworthiness Review Certificate expiry.
    pub arc_valid_until: Option<NaiveDate>,
    /// Third-party liability insurance expiry.
    pub insurance_valid_until: Option<NaiveDate>,
    /// Inactive aircraft cannot be put on new PDT pages.
    pub is_active: bool,
}

/// Urgency bands for an aircraft's dated items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AircraftStatuses {
    /// Next maintenance date.
    pub next_service: UrgencyBand,
    /// ARC expiry.
    pub arc: UrgencyBand,
    /// Insurance expiry.
    pub insurance: UrgencyBand,
}

impl Aircraft {
    /// Create an active aircraft with zero base counters and no dates.
    #[must_use]
    pub fn new(
        manufacturer: impl Into<String>,
        aircraft_type: impl Into<String>,
        serial_number: impl Into<String>,
        registration_marks: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            manufacturer: manufacturer.into(),
            aircraft_type: aircraft_type.into(),
            serial_number: serial_number.into(),
            registration_marks: registration_marks.into(),
            base_flight_hours: FlightHours::ZERO,
            base_landings: 0,
            next_service_date: None,
            next_service_hours: None,
            arc_valid_until: None,
            insurance_valid_until: None,
            is_active: true,
        }
    }

    /// Check every field and return the cleaned record.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] encountered.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            manufacturer: validate::required("manufacturer", &self.manufacturer, 255)?,
            aircraft_type: validate::required("aircraft_type", &self.aircraft_type, 255)?,
            serial_number: validate::required("serial_number", &self.serial_number, 100)?,
            registration_marks: validate::registration_marks(&self.registration_marks)?,
            ..self
        })
    }

    /// Urgency of the next service, ARC and insurance dates as of `today`.
    #[must_use]
    pub fn statuses(&self, thresholds: &ExpiryThresholds, today: NaiveDate) -> AircraftStatuses {
        AircraftStatuses {
            next_service: thresholds.classify(self.next_service_date, today),
            arc: thresholds.classify(self.arc_valid_until, today),
            insurance: thresholds.classify(self.insurance_valid_until, today),
        }
    }
}

impl std::fmt::Display for Aircraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.registration_marks, self.manufacturer, self.aircraft_type
        )
    }
}

/// A pilot who can be assigned to flight operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pilot {
    /// Storage identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Account name. Unique.
    pub username: String,
    /// Licence number, e.g. `PL.FCL.42752.PPL(A)`. Unique.
    pub license_number: String,
    /// Contact phone number.
    pub phone_number: String,
    /// SEP(L) class rating expiry.
    pub sepl_valid_until: Option<NaiveDate>,
    /// Medical certificate expiry.
    pub medical_valid_until: Option<NaiveDate>,
    /// Inactive pilots cannot be assigned to new operations.
    pub is_active: bool,
}

/// Urgency bands for a pilot's rating and medical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PilotStatuses {
    /// SEP(L) rating expiry.
    pub sepl: UrgencyBand,
    /// Medical expiry.
    pub medical: UrgencyBand,
}

impl Pilot {
    /// Create an active pilot with no expiry dates.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        license_number: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            username: username.into(),
            license_number: license_number.into(),
            phone_number: phone_number.into(),
            sepl_valid_until: None,
            medical_valid_until: None,
            is_active: true,
        }
    }

    /// Check every field and return the cleaned record.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] encountered.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            first_name: validate::required("first_name", &self.first_name, 150)?,
            last_name: validate::required("last_name", &self.last_name, 150)?,
            email: validate::email(self.email.as_deref())?,
            username: validate::username(&self.username)?,
            license_number: validate::required("license_number", &self.license_number, 100)?,
            phone_number: validate::required("phone_number", &self.phone_number, 20)?,
            ..self
        })
    }

    /// `First Last`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Urgency of the SEP(L) and medical dates as of `today`.
    #[must_use]
    pub fn statuses(&self, thresholds: &ExpiryThresholds, today: NaiveDate) -> PilotStatuses {
        PilotStatuses {
            sepl: thresholds.classify(self.sepl_valid_until, today),
            medical: thresholds.classify(self.medical_valid_until, today),
        }
    }
}

impl std::fmt::Display for Pilot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.license_number)
    }
}

/// One daily flight-log sheet for an aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdtPage {
    /// Storage identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The aircraft this page belongs to.
    pub aircraft_id: i64,
    /// Date written on the page.
    pub pdt_date: NaiveDate,
    /// Page number, unique per aircraft.
    pub page_number: String,
    /// Persons on board, at least one.
    pub persons_on_board: u16,
    /// Fuel added, litres.
    pub fuel_added: f64,
    /// Fuel at start, litres.
    pub fuel_at_start: f64,
    /// Oil added, litres.
    pub oil_added: f64,
    /// Oil at start, litres.
    pub oil_at_start: f64,
    /// Remarks and defects noted after the last operation.
    pub last_operation_notes: String,
    /// Set by storage on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by storage on every write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PdtPage {
    /// Create a page with zero fuel and oil figures and no notes.
    #[must_use]
    pub fn new(
        aircraft_id: i64,
        pdt_date: NaiveDate,
        page_number: impl Into<String>,
        persons_on_board: u16,
    ) -> Self {
        Self {
            id: None,
            aircraft_id,
            pdt_date,
            page_number: page_number.into(),
            persons_on_board,
            fuel_added: 0.0,
            fuel_at_start: 0.0,
            oil_added: 0.0,
            oil_at_start: 0.0,
            last_operation_notes: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Check every field and return the cleaned record.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] encountered.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            page_number: validate::required("page_number", &self.page_number, 50)?,
            persons_on_board: validate::at_least_one("persons_on_board", self.persons_on_board)?,
            fuel_added: validate::non_negative("fuel_added", self.fuel_added)?,
            fuel_at_start: validate::non_negative("fuel_at_start", self.fuel_at_start)?,
            oil_added: validate::non_negative("oil_added", self.oil_added)?,
            oil_at_start: validate::non_negative("oil_at_start", self.oil_at_start)?,
            last_operation_notes: self.last_operation_notes.trim().to_string(),
            ..self
        })
    }
}

/// One flight leg logged on a PDT page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOperation {
    /// Storage identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Owning page; assigned by storage when the page is saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdt_page_id: Option<i64>,
    /// Pilot in command.
    pub pilot_id: i64,
    /// Take-off clock time.
    pub departure_time: NaiveTime,
    /// Take-off aerodrome, ICAO code.
    pub departure_location: String,
    /// Landing clock time.
    pub landing_time: NaiveTime,
    /// Landing aerodrome, ICAO code.
    pub landing_location: String,
    /// Landings made during the leg, at least one.
    pub number_of_landings: u16,
    /// Manually entered flight time, serialized as seconds. When `None`
    /// it is derived from the clock times on save.
    #[serde(with = "opt_duration_secs", default)]
    pub flight_time: Option<Duration>,
    /// Engine-hours counter reading after the flight.
    pub engine_hours_after_flight: f64,
    /// Set by storage on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by storage on every write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FlightOperation {
    /// Create an operation whose flight time will be derived from the clock times.
    #[must_use]
    pub fn new(
        pilot_id: i64,
        departure_time: NaiveTime,
        departure_location: impl Into<String>,
        landing_time: NaiveTime,
        landing_location: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            pdt_page_id: None,
            pilot_id,
            departure_time,
            departure_location: departure_location.into(),
            landing_time,
            landing_location: landing_location.into(),
            number_of_landings: 1,
            flight_time: None,
            engine_hours_after_flight: 0.0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Check every field and return the cleaned record.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] encountered.
    pub fn validated(self) -> Result<Self> {
        if self.flight_time.is_some_and(|d| d < Duration::zero()) {
            return Err(Error::validation("flight_time", "must not be negative"));
        }
        Ok(Self {
            departure_location: validate::icao_code("departure_location", &self.departure_location)?,
            landing_location: validate::icao_code("landing_location", &self.landing_location)?,
            number_of_landings: validate::at_least_one(
                "number_of_landings",
                self.number_of_landings,
            )?,
            engine_hours_after_flight: validate::non_negative(
                "engine_hours_after_flight",
                self.engine_hours_after_flight,
            )?,
            ..self
        })
    }

    /// The flight time to store: the manual value if present, otherwise
    /// derived from departure and landing times.
    #[must_use]
    pub fn resolved_flight_time(&self) -> Duration {
        resolve_flight_time(self.flight_time, self.departure_time, self.landing_time)
    }
}

/// A stored flight operation joined with its page, aircraft and pilot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedOperation {
    /// The operation; `flight_time` is always `Some` once stored.
    pub operation: FlightOperation,
    /// Date of the owning page.
    pub pdt_date: NaiveDate,
    /// Number of the owning page.
    pub page_number: String,
    /// Registration of the aircraft flown.
    pub registration_marks: String,
    /// `First Last` of the pilot.
    pub pilot_name: String,
}

impl LoggedOperation {
    /// Stored flight time.
    #[must_use]
    pub fn flight_time(&self) -> Duration {
        self.operation.resolved_flight_time()
    }
}

/// A PDT page with its aircraft registration and operation totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageListing {
    /// The page.
    pub page: PdtPage,
    /// Registration of the page's aircraft.
    pub registration_marks: String,
    /// Number of operations on the page.
    pub operation_count: u32,
    /// Sum of the operations' flight times, serialized as seconds.
    #[serde(serialize_with = "duration_secs")]
    pub total_flight_time: Duration,
}

impl std::fmt::Display for PageListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PDT {} - {} ({})",
            self.page.page_number, self.registration_marks, self.page.pdt_date
        )
    }
}

/// Serialize a duration as whole seconds.
pub(crate) fn duration_secs<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.num_seconds())
}

mod opt_duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aircraft_display() {
        let aircraft = Aircraft::new("Cessna", "172S", "172S-11001", "SP-ABC");
        assert_eq!(aircraft.to_string(), "SP-ABC (Cessna 172S)");
    }

    #[test]
    fn test_aircraft_validated_normalizes() {
        let aircraft = Aircraft::new(" Cessna ", "172S", "172S-11001", "sp-abc")
            .validated()
            .unwrap();
        assert_eq!(aircraft.manufacturer, "Cessna");
        assert_eq!(aircraft.registration_marks, "SP-ABC");
    }

    #[test]
    fn test_aircraft_validated_rejects_blank_serial() {
        let err = Aircraft::new("Cessna", "172S", "", "SP-ABC")
            .validated()
            .unwrap_err();
        assert!(err.to_string().contains("serial_number"));
    }

    #[test]
    fn test_aircraft_statuses() {
        let mut aircraft = Aircraft::new("Cessna", "172S", "1", "SP-ABC");
        aircraft.arc_valid_until = Some(ymd(2025, 9, 15));
        aircraft.insurance_valid_until = Some(ymd(2025, 7, 1));

        let statuses = aircraft.statuses(&ExpiryThresholds::default(), ymd(2025, 6, 15));
        assert_eq!(statuses.arc, UrgencyBand::Ok);
        assert_eq!(statuses.insurance, UrgencyBand::Critical);
        assert_eq!(statuses.next_service, UrgencyBand::Unknown);
    }

    #[test]
    fn test_pilot_display_and_statuses() {
        let mut pilot = Pilot::new("Jan", "Kowalski", "jkowalski", "PL.FCL.1", "+48 600 000 000");
        pilot.medical_valid_until = Some(ymd(2025, 8, 1));
        assert_eq!(pilot.to_string(), "Jan Kowalski (PL.FCL.1)");

        let statuses = pilot.statuses(&ExpiryThresholds::default(), ymd(2025, 6, 15));
        assert_eq!(statuses.medical, UrgencyBand::Warning);
        assert_eq!(statuses.sepl, UrgencyBand::Unknown);
    }

    #[test]
    fn test_pilot_validated_rejects_bad_email() {
        let mut pilot = Pilot::new("Jan", "Kowalski", "jkowalski", "PL.FCL.1", "600");
        pilot.email = Some("nope".to_string());
        assert!(pilot.validated().unwrap_err().is_validation());
    }

    #[test]
    fn test_page_validated_requires_person_on_board() {
        let page = PdtPage::new(1, ymd(2025, 6, 15), "17", 0);
        let err = page.validated().unwrap_err();
        assert!(err.to_string().contains("persons_on_board"));
    }

    #[test]
    fn test_page_validated_rejects_negative_fuel() {
        let mut page = PdtPage::new(1, ymd(2025, 6, 15), "17", 2);
        page.fuel_added = -1.0;
        assert!(page.validated().is_err());
    }

    #[test]
    fn test_operation_validated_uppercases_icao() {
        let op = FlightOperation::new(1, hm(10, 0), "epwa", hm(11, 0), "epkk")
            .validated()
            .unwrap();
        assert_eq!(op.departure_location, "EPWA");
        assert_eq!(op.landing_location, "EPKK");
    }

    #[test]
    fn test_operation_validated_rejects_zero_landings() {
        let mut op = FlightOperation::new(1, hm(10, 0), "EPWA", hm(11, 0), "EPKK");
        op.number_of_landings = 0;
        assert!(op.validated().is_err());
    }

    #[test]
    fn test_operation_validated_rejects_negative_manual_time() {
        let mut op = FlightOperation::new(1, hm(10, 0), "EPWA", hm(11, 0), "EPKK");
        op.flight_time = Some(Duration::minutes(-1));
        assert!(op.validated().is_err());
    }

    #[test]
    fn test_resolved_flight_time_derives_overnight() {
        let op = FlightOperation::new(1, hm(23, 0), "EPWA", hm(1, 0), "EPKK");
        assert_eq!(op.resolved_flight_time(), Duration::hours(2));
    }

    #[test]
    fn test_resolved_flight_time_keeps_manual_value() {
        let mut op = FlightOperation::new(1, hm(10, 0), "EPWA", hm(11, 30), "EPKK");
        op.flight_time = Some(Duration::minutes(80));
        assert_eq!(op.resolved_flight_time(), Duration::minutes(80));
    }

    #[test]
    fn test_operation_flight_time_serializes_as_seconds() {
        let mut op = FlightOperation::new(1, hm(10, 0), "EPWA", hm(11, 30), "EPKK");
        op.flight_time = Some(Duration::minutes(90));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["flight_time"], 5400);

        let back: FlightOperation = serde_json::from_value(json).unwrap();
        assert_eq!(back.flight_time, Some(Duration::minutes(90)));
    }
}
