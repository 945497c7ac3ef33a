//! Read-only summaries assembled from storage for display.
//!
//! Every builder takes `today` so output is reproducible.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::compute::ExpiryThresholds;
use crate::error::Result;
use crate::model::{
    duration_secs, Aircraft, AircraftStatuses, FlightOperation, LoggedOperation, PageListing,
    PdtPage, Pilot, PilotStatuses,
};
use crate::storage::{PilotTotals, Storage, StorageStats, HISTORY_LIMIT};

/// Pages and aircraft shown on the dashboard.
const DASHBOARD_ROWS: usize = 5;

/// An aircraft with its lifetime totals and expiry bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftSummary {
    /// The aircraft record.
    pub aircraft: Aircraft,
    /// Base flight hours plus every logged operation.
    #[serde(serialize_with = "duration_secs")]
    pub total_flight_time: Duration,
    /// Base landings plus every logged operation.
    pub total_landings: u32,
    /// Highest engine-hours reading logged.
    pub max_engine_hours: Option<f64>,
    /// Urgency of next service, ARC and insurance.
    pub statuses: AircraftStatuses,
    /// Latest operations, newest first.
    pub recent_operations: Vec<LoggedOperation>,
}

impl AircraftSummary {
    /// Build the summary for aircraft `id`.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown aircraft, or a storage error.
    pub fn build(
        storage: &Storage,
        id: i64,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Result<Self> {
        let aircraft = storage.require_aircraft(id)?;
        let totals = storage.aircraft_totals(id)?;
        let recent_operations = storage.aircraft_operations(id, HISTORY_LIMIT)?;

        Ok(Self {
            total_flight_time: aircraft.base_flight_hours.to_duration() + totals.flight_time,
            total_landings: aircraft.base_landings.saturating_add(totals.landings),
            max_engine_hours: totals.max_engine_hours,
            statuses: aircraft.statuses(thresholds, today),
            aircraft,
            recent_operations,
        })
    }
}

/// A pilot with flight counts and expiry bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotSummary {
    /// The pilot record.
    pub pilot: Pilot,
    /// Flights and landings logged.
    pub totals: PilotTotals,
    /// Urgency of SEP(L) and medical.
    pub statuses: PilotStatuses,
    /// Latest operations, newest first.
    pub recent_operations: Vec<LoggedOperation>,
}

impl PilotSummary {
    /// Build the summary for pilot `id`.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown pilot, or a storage error.
    pub fn build(
        storage: &Storage,
        id: i64,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Result<Self> {
        let pilot = storage.require_pilot(id)?;
        Ok(Self {
            totals: storage.pilot_totals(id)?,
            recent_operations: storage.pilot_operations(id, HISTORY_LIMIT)?,
            statuses: pilot.statuses(thresholds, today),
            pilot,
        })
    }
}

/// An aircraft with its expiry bands, as listed by `aircraft list` and `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftStatusRow {
    /// The aircraft record.
    pub aircraft: Aircraft,
    /// Urgency of next service, ARC and insurance.
    pub statuses: AircraftStatuses,
}

/// A pilot with expiry bands, as listed by `pilot list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotStatusRow {
    /// The pilot record.
    pub pilot: Pilot,
    /// Urgency of SEP(L) and medical.
    pub statuses: PilotStatuses,
}

impl AircraftStatusRow {
    /// Attach bands to each aircraft.
    #[must_use]
    pub fn from_list(
        aircraft: Vec<Aircraft>,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Vec<Self> {
        aircraft
            .into_iter()
            .map(|aircraft| Self {
                statuses: aircraft.statuses(thresholds, today),
                aircraft,
            })
            .collect()
    }
}

impl PilotStatusRow {
    /// Attach bands to each pilot.
    #[must_use]
    pub fn from_list(
        pilots: Vec<Pilot>,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Vec<Self> {
        pilots
            .into_iter()
            .map(|pilot| Self {
                statuses: pilot.statuses(thresholds, today),
                pilot,
            })
            .collect()
    }
}

/// One operation on a page, with the pilot's name resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOperation {
    /// The stored operation.
    #[serde(flatten)]
    pub operation: FlightOperation,
    /// `First Last` of the pilot.
    pub pilot_name: String,
}

/// A PDT page with its aircraft and operations, as shown by `pdt show`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDetail {
    /// The page header.
    pub page: PdtPage,
    /// Registration of the page's aircraft.
    pub registration_marks: String,
    /// Operations in departure order.
    pub operations: Vec<PageOperation>,
    /// Sum of the operations' flight times.
    #[serde(serialize_with = "duration_secs")]
    pub total_flight_time: Duration,
    /// Sum of the operations' landings.
    pub total_landings: u32,
}

impl PageDetail {
    /// Load page `id` with everything needed to display it.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown page, or a storage error.
    pub fn build(storage: &Storage, id: i64) -> Result<Self> {
        let page = storage.require_pdt_page(id)?;
        let aircraft = storage.require_aircraft(page.aircraft_id)?;

        let mut names: HashMap<i64, String> = HashMap::new();
        let mut operations = Vec::new();
        for operation in storage.page_operations(id)? {
            let pilot_name = match names.get(&operation.pilot_id) {
                Some(name) => name.clone(),
                None => {
                    let name = storage.require_pilot(operation.pilot_id)?.full_name();
                    names.insert(operation.pilot_id, name.clone());
                    name
                }
            };
            operations.push(PageOperation {
                operation,
                pilot_name,
            });
        }

        let total_flight_time = operations
            .iter()
            .map(|op| op.operation.resolved_flight_time())
            .fold(Duration::zero(), |acc, d| acc + d);
        let total_landings = operations
            .iter()
            .map(|op| u32::from(op.operation.number_of_landings))
            .sum();

        Ok(Self {
            page,
            registration_marks: aircraft.registration_marks,
            operations,
            total_flight_time,
            total_landings,
        })
    }
}

/// Overview for the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Day the bands were computed for.
    pub today: NaiveDate,
    /// Record counts.
    pub stats: StorageStats,
    /// Most recently created pages.
    pub recent_pages: Vec<PageListing>,
    /// First active aircraft by registration.
    pub active_aircraft: Vec<AircraftStatusRow>,
}

impl Dashboard {
    /// Collect the dashboard.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn build(
        storage: &Storage,
        thresholds: &ExpiryThresholds,
        today: NaiveDate,
    ) -> Result<Self> {
        let stats = storage.stats()?;
        let recent_pages = storage.recent_pdt_pages(DASHBOARD_ROWS)?;
        let mut aircraft = storage.list_aircraft(true)?;
        aircraft.truncate(DASHBOARD_ROWS);
        let active_aircraft = AircraftStatusRow::from_list(aircraft, thresholds, today);

        debug!(
            "Dashboard: {} pages, {} aircraft rows",
            recent_pages.len(),
            active_aircraft.len()
        );
        Ok(Self {
            today,
            stats,
            recent_pages,
            active_aircraft,
        })
    }
}
