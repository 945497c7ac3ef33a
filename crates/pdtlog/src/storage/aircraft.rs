//! Aircraft records and their operation totals.

use chrono::Duration;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::compute::FlightHours;
use crate::error::{Error, Result};
use crate::model::{duration_secs, Aircraft, LoggedOperation};

use super::{date_to_sql, limit_param, opt_date_column, Storage};

const SELECT_AIRCRAFT: &str = r"
    SELECT id, manufacturer, aircraft_type, serial_number, registration_marks,
           base_flight_minutes, base_landings, next_service_date, next_service_minutes,
           arc_valid_until, insurance_valid_until, is_active
    FROM aircraft
";

/// Sums over every flight operation logged for one aircraft.
///
/// Base counters entered with the aircraft are not included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AircraftTotals {
    /// Logged operations.
    pub operations: u32,
    /// Sum of stored flight times.
    #[serde(serialize_with = "duration_secs")]
    pub flight_time: Duration,
    /// Sum of landings.
    pub landings: u32,
    /// Highest engine-hours reading, if anything was logged.
    pub max_engine_hours: Option<f64>,
}

impl Storage {
    /// Insert a new aircraft and return its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad fields and a conflict if the serial
    /// number or registration marks are taken.
    pub fn insert_aircraft(&self, aircraft: &Aircraft) -> Result<i64> {
        let aircraft = aircraft.clone().validated()?;
        self.ensure_aircraft_unique(&aircraft, None)?;

        self.conn.execute(
            r"
            INSERT INTO aircraft (manufacturer, aircraft_type, serial_number, registration_marks,
                base_flight_minutes, base_landings, next_service_date, next_service_minutes,
                arc_valid_until, insurance_valid_until, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                aircraft.manufacturer,
                aircraft.aircraft_type,
                aircraft.serial_number,
                aircraft.registration_marks,
                aircraft.base_flight_hours.minutes(),
                aircraft.base_landings,
                aircraft.next_service_date.map(date_to_sql),
                aircraft.next_service_hours.map(FlightHours::minutes),
                aircraft.arc_valid_until.map(date_to_sql),
                aircraft.insurance_valid_until.map(date_to_sql),
                aircraft.is_active,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Added aircraft {} with id {}", aircraft.registration_marks, id);
        Ok(id)
    }

    /// Overwrite every field of aircraft `id`.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown id, plus the errors of
    /// [`Storage::insert_aircraft`].
    pub fn update_aircraft(&self, id: i64, aircraft: &Aircraft) -> Result<()> {
        let aircraft = aircraft.clone().validated()?;
        self.require_aircraft(id)?;
        self.ensure_aircraft_unique(&aircraft, Some(id))?;

        self.conn.execute(
            r"
            UPDATE aircraft SET manufacturer = ?2, aircraft_type = ?3, serial_number = ?4,
                registration_marks = ?5, base_flight_minutes = ?6, base_landings = ?7,
                next_service_date = ?8, next_service_minutes = ?9, arc_valid_until = ?10,
                insurance_valid_until = ?11, is_active = ?12
            WHERE id = ?1
            ",
            params![
                id,
                aircraft.manufacturer,
                aircraft.aircraft_type,
                aircraft.serial_number,
                aircraft.registration_marks,
                aircraft.base_flight_hours.minutes(),
                aircraft.base_landings,
                aircraft.next_service_date.map(date_to_sql),
                aircraft.next_service_hours.map(FlightHours::minutes),
                aircraft.arc_valid_until.map(date_to_sql),
                aircraft.insurance_valid_until.map(date_to_sql),
                aircraft.is_active,
            ],
        )?;

        info!("Updated aircraft {}", id);
        Ok(())
    }

    fn ensure_aircraft_unique(&self, aircraft: &Aircraft, exclude_id: Option<i64>) -> Result<()> {
        self.ensure_unique(
            "aircraft",
            "aircraft",
            "serial_number",
            &aircraft.serial_number,
            exclude_id,
        )?;
        self.ensure_unique(
            "aircraft",
            "aircraft",
            "registration_marks",
            &aircraft.registration_marks,
            exclude_id,
        )
    }

    /// Get an aircraft by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_aircraft(&self, id: i64) -> Result<Option<Aircraft>> {
        let sql = format!("{SELECT_AIRCRAFT} WHERE id = ?1");
        let aircraft = self
            .conn
            .query_row(&sql, [id], row_to_aircraft)
            .optional()?;
        Ok(aircraft)
    }

    /// Get an aircraft by id, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such aircraft.
    pub fn require_aircraft(&self, id: i64) -> Result<Aircraft> {
        self.get_aircraft(id)?
            .ok_or_else(|| Error::not_found("aircraft", id))
    }

    /// List aircraft ordered by registration marks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_aircraft(&self, active_only: bool) -> Result<Vec<Aircraft>> {
        let sql = format!(
            "{SELECT_AIRCRAFT} WHERE (?1 = 0 OR is_active = 1) ORDER BY registration_marks"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let aircraft = stmt
            .query_map([active_only], row_to_aircraft)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} aircraft", aircraft.len());
        Ok(aircraft)
    }

    /// Totals over all operations logged on this aircraft's pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn aircraft_totals(&self, aircraft_id: i64) -> Result<AircraftTotals> {
        let totals = self.conn.query_row(
            r"
            SELECT COUNT(o.id),
                   COALESCE(SUM(o.flight_time_seconds), 0),
                   COALESCE(SUM(o.number_of_landings), 0),
                   MAX(o.engine_hours_after_flight)
            FROM flight_operations o
            JOIN pdt_pages p ON p.id = o.pdt_page_id
            WHERE p.aircraft_id = ?1
            ",
            [aircraft_id],
            |row| {
                Ok(AircraftTotals {
                    operations: row.get(0)?,
                    flight_time: Duration::seconds(row.get(1)?),
                    landings: row.get(2)?,
                    max_engine_hours: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// The latest operations flown on this aircraft, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn aircraft_operations(
        &self,
        aircraft_id: i64,
        limit: usize,
    ) -> Result<Vec<LoggedOperation>> {
        self.logged_operations("p.aircraft_id = ?1", aircraft_id, limit_param(limit))
    }
}

fn row_to_aircraft(row: &Row<'_>) -> rusqlite::Result<Aircraft> {
    Ok(Aircraft {
        id: Some(row.get(0)?),
        manufacturer: row.get(1)?,
        aircraft_type: row.get(2)?,
        serial_number: row.get(3)?,
        registration_marks: row.get(4)?,
        base_flight_hours: FlightHours::from_minutes(row.get(5)?),
        base_landings: row.get(6)?,
        next_service_date: opt_date_column(row, 7)?,
        next_service_hours: row.get::<_, Option<u32>>(8)?.map(FlightHours::from_minutes),
        arc_valid_until: opt_date_column(row, 9)?,
        insurance_valid_until: opt_date_column(row, 10)?,
        is_active: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::storage::tests::{add_aircraft, add_page, add_pilot, create_test_storage, ymd};
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let mut aircraft = Aircraft::new("Cessna", "172S", "172S-11001", "sp-abc");
        aircraft.base_flight_hours = "1234.30".parse().unwrap();
        aircraft.base_landings = 2000;
        aircraft.arc_valid_until = Some(ymd(2025, 9, 15));
        aircraft.next_service_hours = Some("1300.00".parse().unwrap());

        let id = storage.insert_aircraft(&aircraft).unwrap();
        let stored = storage.get_aircraft(id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.registration_marks, "SP-ABC");
        assert_eq!(stored.base_flight_hours.to_string(), "1234:30");
        assert_eq!(stored.base_landings, 2000);
        assert_eq!(stored.arc_valid_until, Some(ymd(2025, 9, 15)));
        assert_eq!(stored.insurance_valid_until, None);
        assert_eq!(stored.next_service_hours.map(|h| h.minutes()), Some(1300 * 60));
        assert!(stored.is_active);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_aircraft(99).unwrap().is_none());
        assert!(storage.require_aircraft(99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_registration_is_conflict() {
        let storage = create_test_storage();
        add_aircraft(&storage, "SP-ABC");

        let err = storage
            .insert_aircraft(&Aircraft::new("Piper", "PA-28", "other", "sp-abc"))
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("registration_marks"));
    }

    #[test]
    fn test_duplicate_serial_is_conflict() {
        let storage = create_test_storage();
        storage
            .insert_aircraft(&Aircraft::new("Cessna", "172S", "SN-1", "SP-AAA"))
            .unwrap();

        let err = storage
            .insert_aircraft(&Aircraft::new("Cessna", "172S", "SN-1", "SP-BBB"))
            .unwrap_err();
        assert!(err.to_string().contains("serial_number"));
    }

    #[test]
    fn test_update_keeps_own_unique_values() {
        let storage = create_test_storage();
        let id = add_aircraft(&storage, "SP-ABC");

        let mut aircraft = storage.require_aircraft(id).unwrap();
        aircraft.is_active = false;
        aircraft.insurance_valid_until = Some(ymd(2026, 1, 1));
        storage.update_aircraft(id, &aircraft).unwrap();

        let stored = storage.require_aircraft(id).unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.insurance_valid_until, Some(ymd(2026, 1, 1)));
    }

    #[test]
    fn test_update_rejects_taken_registration() {
        let storage = create_test_storage();
        add_aircraft(&storage, "SP-AAA");
        let id = add_aircraft(&storage, "SP-BBB");

        let mut aircraft = storage.require_aircraft(id).unwrap();
        aircraft.registration_marks = "SP-AAA".to_string();
        assert!(storage.update_aircraft(id, &aircraft).unwrap_err().is_conflict());
    }

    #[test]
    fn test_update_unknown_id() {
        let storage = create_test_storage();
        let aircraft = Aircraft::new("Cessna", "172S", "SN", "SP-ABC");
        assert!(storage.update_aircraft(5, &aircraft).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_ordered_and_filtered() {
        let storage = create_test_storage();
        add_aircraft(&storage, "SP-ZZZ");
        let inactive = add_aircraft(&storage, "SP-MMM");
        add_aircraft(&storage, "SP-AAA");

        let mut aircraft = storage.require_aircraft(inactive).unwrap();
        aircraft.is_active = false;
        storage.update_aircraft(inactive, &aircraft).unwrap();

        let all: Vec<_> = storage
            .list_aircraft(false)
            .unwrap()
            .into_iter()
            .map(|a| a.registration_marks)
            .collect();
        assert_eq!(all, ["SP-AAA", "SP-MMM", "SP-ZZZ"]);

        let active = storage.list_aircraft(true).unwrap();
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_totals_empty() {
        let storage = create_test_storage();
        let id = add_aircraft(&storage, "SP-ABC");

        let totals = storage.aircraft_totals(id).unwrap();
        assert_eq!(totals.operations, 0);
        assert_eq!(totals.flight_time, Duration::zero());
        assert_eq!(totals.landings, 0);
        assert_eq!(totals.max_engine_hours, None);
    }

    #[test]
    fn test_totals_sum_only_this_aircraft() {
        let storage = create_test_storage();
        let abc = add_aircraft(&storage, "SP-ABC");
        let xyz = add_aircraft(&storage, "SP-XYZ");
        let pilot = add_pilot(&storage, "jk", "Kowalski");

        add_page(&storage, abc, pilot, "1", ymd(2025, 6, 1), 45);
        add_page(&storage, abc, pilot, "2", ymd(2025, 6, 2), 30);
        add_page(&storage, xyz, pilot, "1", ymd(2025, 6, 2), 600);

        let totals = storage.aircraft_totals(abc).unwrap();
        assert_eq!(totals.operations, 2);
        assert_eq!(totals.flight_time, Duration::minutes(75));
        assert_eq!(totals.landings, 2);
        assert_eq!(totals.max_engine_hours, Some(0.0));
    }

    #[test]
    fn test_operations_newest_first() {
        let storage = create_test_storage();
        let abc = add_aircraft(&storage, "SP-ABC");
        let pilot = add_pilot(&storage, "jk", "Kowalski");

        add_page(&storage, abc, pilot, "1", ymd(2025, 6, 1), 45);
        add_page(&storage, abc, pilot, "2", ymd(2025, 6, 3), 30);
        add_page(&storage, abc, pilot, "3", ymd(2025, 6, 2), 20);

        let ops = storage.aircraft_operations(abc, 2).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].page_number, "2");
        assert_eq!(ops[1].page_number, "3");
        assert_eq!(ops[0].registration_marks, "SP-ABC");
        assert_eq!(ops[0].pilot_name, "Jan Kowalski");
    }

    #[test]
    fn test_operations_within_a_day_in_departure_order() {
        use crate::model::{FlightOperation, PdtPage};
        use crate::storage::tests::hm;

        let storage = create_test_storage();
        let abc = add_aircraft(&storage, "SP-ABC");
        let pilot = add_pilot(&storage, "jk", "Kowalski");
        add_page(&storage, abc, pilot, "1", ymd(2025, 6, 1), 45);

        let late = FlightOperation::new(pilot, hm(15, 0), "EPKK", hm(16, 0), "EPWA");
        let early = FlightOperation::new(pilot, hm(8, 0), "EPWA", hm(9, 0), "EPKK");
        storage
            .insert_pdt_page(&PdtPage::new(abc, ymd(2025, 6, 5), "2", 1), &[late, early])
            .unwrap();

        let ops = storage.aircraft_operations(abc, 20).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].operation.departure_time, hm(8, 0));
        assert_eq!(ops[1].operation.departure_time, hm(15, 0));
        assert_eq!(ops[2].pdt_date, ymd(2025, 6, 1));
    }
}
