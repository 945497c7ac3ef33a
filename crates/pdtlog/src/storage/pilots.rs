//! Pilot records.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{LoggedOperation, Pilot};

use super::{date_to_sql, limit_param, opt_date_column, Storage};

const SELECT_PILOTS: &str = r"
    SELECT id, first_name, last_name, email, username, license_number, phone_number,
           sepl_valid_until, medical_valid_until, is_active
    FROM pilots
";

/// What a pilot has flown, counted over logged operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PilotTotals {
    /// Operations flown as pilot in command.
    pub flights: u32,
    /// Landings made on those operations.
    pub landings: u32,
}

impl Storage {
    /// Insert a new pilot and return its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad fields and a conflict if the
    /// username or licence number is taken.
    pub fn insert_pilot(&self, pilot: &Pilot) -> Result<i64> {
        let pilot = pilot.clone().validated()?;
        self.ensure_pilot_unique(&pilot, None)?;

        self.conn.execute(
            r"
            INSERT INTO pilots (first_name, last_name, email, username, license_number,
                phone_number, sepl_valid_until, medical_valid_until, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                pilot.first_name,
                pilot.last_name,
                pilot.email,
                pilot.username,
                pilot.license_number,
                pilot.phone_number,
                pilot.sepl_valid_until.map(date_to_sql),
                pilot.medical_valid_until.map(date_to_sql),
                pilot.is_active,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Added pilot {} with id {}", pilot.username, id);
        Ok(id)
    }

    /// Overwrite every field of pilot `id`.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown id, plus the errors of
    /// [`Storage::insert_pilot`].
    pub fn update_pilot(&self, id: i64, pilot: &Pilot) -> Result<()> {
        let pilot = pilot.clone().validated()?;
        self.require_pilot(id)?;
        self.ensure_pilot_unique(&pilot, Some(id))?;

        self.conn.execute(
            r"
            UPDATE pilots SET first_name = ?2, last_name = ?3, email = ?4, username = ?5,
                license_number = ?6, phone_number = ?7, sepl_valid_until = ?8,
                medical_valid_until = ?9, is_active = ?10
            WHERE id = ?1
            ",
            params![
                id,
                pilot.first_name,
                pilot.last_name,
                pilot.email,
                pilot.username,
                pilot.license_number,
                pilot.phone_number,
                pilot.sepl_valid_until.map(date_to_sql),
                pilot.medical_valid_until.map(date_to_sql),
                pilot.is_active,
            ],
        )?;

        info!("Updated pilot {}", id);
        Ok(())
    }

    fn ensure_pilot_unique(&self, pilot: &Pilot, exclude_id: Option<i64>) -> Result<()> {
        self.ensure_unique("pilots", "pilot", "username", &pilot.username, exclude_id)?;
        self.ensure_unique(
            "pilots",
            "pilot",
            "license_number",
            &pilot.license_number,
            exclude_id,
        )
    }

    /// Get a pilot by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_pilot(&self, id: i64) -> Result<Option<Pilot>> {
        let sql = format!("{SELECT_PILOTS} WHERE id = ?1");
        let pilot = self.conn.query_row(&sql, [id], row_to_pilot).optional()?;
        Ok(pilot)
    }

    /// Get a pilot by id, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such pilot.
    pub fn require_pilot(&self, id: i64) -> Result<Pilot> {
        self.get_pilot(id)?.ok_or_else(|| Error::not_found("pilot", id))
    }

    /// List pilots ordered by last name, then first name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_pilots(&self, active_only: bool) -> Result<Vec<Pilot>> {
        let sql = format!(
            "{SELECT_PILOTS} WHERE (?1 = 0 OR is_active = 1) ORDER BY last_name, first_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pilots = stmt
            .query_map([active_only], row_to_pilot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} pilots", pilots.len());
        Ok(pilots)
    }

    /// Flights and landings logged for this pilot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pilot_totals(&self, pilot_id: i64) -> Result<PilotTotals> {
        let totals = self.conn.query_row(
            r"
            SELECT COUNT(*), COALESCE(SUM(number_of_landings), 0)
            FROM flight_operations WHERE pilot_id = ?1
            ",
            [pilot_id],
            |row| {
                Ok(PilotTotals {
                    flights: row.get(0)?,
                    landings: row.get(1)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// The latest operations flown by this pilot, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pilot_operations(&self, pilot_id: i64, limit: usize) -> Result<Vec<LoggedOperation>> {
        self.logged_operations("o.pilot_id = ?1", pilot_id, limit_param(limit))
    }
}

fn row_to_pilot(row: &Row<'_>) -> rusqlite::Result<Pilot> {
    Ok(Pilot {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        username: row.get(4)?,
        license_number: row.get(5)?,
        phone_number: row.get(6)?,
        sepl_valid_until: opt_date_column(row, 7)?,
        medical_valid_until: opt_date_column(row, 8)?,
        is_active: row.get(9)?,
    })
}
