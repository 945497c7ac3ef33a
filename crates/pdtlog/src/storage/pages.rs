//! PDT pages and the flight operations logged on them.
//!
//! A page and its operations are always written together in one
//! transaction, and every operation is stored with its resolved flight time.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{FlightOperation, LoggedOperation, PageListing, PdtPage};

use super::{
    date_column, date_to_sql, limit_param, now, time_column, time_to_sql, timestamp_column,
    Storage,
};

const SELECT_PAGE_COLUMNS: &str = r"
    p.id, p.aircraft_id, p.pdt_date, p.page_number, p.persons_on_board, p.fuel_added,
    p.fuel_at_start, p.oil_added, p.oil_at_start, p.last_operation_notes,
    p.created_at, p.updated_at
";

const SELECT_OPERATION_COLUMNS: &str = r"
    o.id, o.pdt_page_id, o.pilot_id, o.departure_time, o.departure_location,
    o.landing_time, o.landing_location, o.number_of_landings, o.flight_time_seconds,
    o.engine_hours_after_flight, o.created_at, o.updated_at
";

/// Optional restrictions for [`Storage::list_pdt_pages`]. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdtFilter {
    /// Only pages of this aircraft.
    pub aircraft_id: Option<i64>,
    /// Only pages dated on or after this day.
    pub date_from: Option<NaiveDate>,
    /// Only pages dated on or before this day.
    pub date_to: Option<NaiveDate>,
}

impl Storage {
    /// Insert a page together with its flight operations and return the page id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is bad or `operations` is
    /// empty, not-found or inactive errors for the aircraft and pilots, and a
    /// conflict if the aircraft already has a page with this number.
    pub fn insert_pdt_page(&self, page: &PdtPage, operations: &[FlightOperation]) -> Result<i64> {
        let page = page.clone().validated()?;
        let operations = validated_operations(operations)?;
        self.check_aircraft_usable(page.aircraft_id)?;
        self.check_pilots_usable(&operations)?;
        self.ensure_page_number_unique(&page, None)?;

        let stamp = now();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            INSERT INTO pdt_pages (aircraft_id, pdt_date, page_number, persons_on_board,
                fuel_added, fuel_at_start, oil_added, oil_at_start, last_operation_notes,
                created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ",
            params![
                page.aircraft_id,
                date_to_sql(page.pdt_date),
                page.page_number,
                page.persons_on_board,
                page.fuel_added,
                page.fuel_at_start,
                page.oil_added,
                page.oil_at_start,
                page.last_operation_notes,
                stamp,
            ],
        )?;
        let page_id = tx.last_insert_rowid();
        insert_operations(&tx, page_id, &operations, &stamp)?;
        tx.commit()?;

        info!(
            "Added PDT page {} (id {}) with {} operations",
            page.page_number,
            page_id,
            operations.len()
        );
        Ok(page_id)
    }

    /// Update the header of page `id` and, when `operations` is given,
    /// replace its whole operation set.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::insert_pdt_page`], plus not-found for an unknown page.
    pub fn update_pdt_page(
        &self,
        id: i64,
        page: &PdtPage,
        operations: Option<&[FlightOperation]>,
    ) -> Result<()> {
        let page = page.clone().validated()?;
        let operations = operations.map(validated_operations).transpose()?;
        self.require_pdt_page(id)?;
        self.check_aircraft_usable(page.aircraft_id)?;
        if let Some(operations) = &operations {
            self.check_pilots_usable(operations)?;
        }
        self.ensure_page_number_unique(&page, Some(id))?;

        let stamp = now();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            UPDATE pdt_pages SET aircraft_id = ?2, pdt_date = ?3, page_number = ?4,
                persons_on_board = ?5, fuel_added = ?6, fuel_at_start = ?7, oil_added = ?8,
                oil_at_start = ?9, last_operation_notes = ?10, updated_at = ?11
            WHERE id = ?1
            ",
            params![
                id,
                page.aircraft_id,
                date_to_sql(page.pdt_date),
                page.page_number,
                page.persons_on_board,
                page.fuel_added,
                page.fuel_at_start,
                page.oil_added,
                page.oil_at_start,
                page.last_operation_notes,
                stamp,
            ],
        )?;
        if let Some(operations) = &operations {
            let removed = tx.execute("DELETE FROM flight_operations WHERE pdt_page_id = ?1", [id])?;
            debug!("Replacing {} operations on page {}", removed, id);
            insert_operations(&tx, id, operations, &stamp)?;
        }
        tx.commit()?;

        info!("Updated PDT page {}", id);
        Ok(())
    }

    /// Get a page by id, without its operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_pdt_page(&self, id: i64) -> Result<Option<PdtPage>> {
        let sql = format!("SELECT {SELECT_PAGE_COLUMNS} FROM pdt_pages p WHERE p.id = ?1");
        let page = self.conn.query_row(&sql, [id], row_to_page).optional()?;
        Ok(page)
    }

    /// Get a page by id, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such page.
    pub fn require_pdt_page(&self, id: i64) -> Result<PdtPage> {
        self.get_pdt_page(id)?
            .ok_or_else(|| Error::not_found("PDT page", id))
    }

    /// Operations on a page in departure order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn page_operations(&self, page_id: i64) -> Result<Vec<FlightOperation>> {
        let sql = format!(
            "SELECT {SELECT_OPERATION_COLUMNS} FROM flight_operations o
             WHERE o.pdt_page_id = ?1 ORDER BY o.departure_time, o.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let operations = stmt
            .query_map([page_id], row_to_operation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(operations)
    }

    /// Pages matching `filter`, newest date first, then highest page number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_pdt_pages(&self, filter: &PdtFilter) -> Result<Vec<PageListing>> {
        let sql = format!(
            r"
            SELECT {SELECT_PAGE_COLUMNS}, a.registration_marks,
                   COUNT(o.id), COALESCE(SUM(o.flight_time_seconds), 0)
            FROM pdt_pages p
            JOIN aircraft a ON a.id = p.aircraft_id
            LEFT JOIN flight_operations o ON o.pdt_page_id = p.id
            WHERE (?1 IS NULL OR p.aircraft_id = ?1)
              AND (?2 IS NULL OR p.pdt_date >= ?2)
              AND (?3 IS NULL OR p.pdt_date <= ?3)
            GROUP BY p.id
            ORDER BY p.pdt_date DESC, p.page_number DESC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(
                params![
                    filter.aircraft_id,
                    filter.date_from.map(date_to_sql),
                    filter.date_to.map(date_to_sql),
                ],
                row_to_listing,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} PDT pages", pages.len());
        Ok(pages)
    }

    /// The most recently created pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_pdt_pages(&self, limit: usize) -> Result<Vec<PageListing>> {
        let sql = format!(
            r"
            SELECT {SELECT_PAGE_COLUMNS}, a.registration_marks,
                   COUNT(o.id), COALESCE(SUM(o.flight_time_seconds), 0)
            FROM pdt_pages p
            JOIN aircraft a ON a.id = p.aircraft_id
            LEFT JOIN flight_operations o ON o.pdt_page_id = p.id
            GROUP BY p.id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?1
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map([limit_param(limit)], row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// Operations joined with page, aircraft and pilot, newest day first and
    /// in departure order within a day.
    /// `condition` is a trusted SQL fragment binding `?1`.
    pub(super) fn logged_operations(
        &self,
        condition: &str,
        id: i64,
        limit: i64,
    ) -> Result<Vec<LoggedOperation>> {
        let sql = format!(
            r"
            SELECT {SELECT_OPERATION_COLUMNS}, p.pdt_date, p.page_number,
                   a.registration_marks, pi.first_name || ' ' || pi.last_name
            FROM flight_operations o
            JOIN pdt_pages p ON p.id = o.pdt_page_id
            JOIN aircraft a ON a.id = p.aircraft_id
            JOIN pilots pi ON pi.id = o.pilot_id
            WHERE {condition}
            ORDER BY p.pdt_date DESC, o.departure_time ASC, o.id
            LIMIT ?2
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let operations = stmt
            .query_map(params![id, limit], |row| {
                Ok(LoggedOperation {
                    operation: row_to_operation(row)?,
                    pdt_date: date_column(row, 12)?,
                    page_number: row.get(13)?,
                    registration_marks: row.get(14)?,
                    pilot_name: row.get(15)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(operations)
    }

    fn check_aircraft_usable(&self, aircraft_id: i64) -> Result<()> {
        let aircraft = self.require_aircraft(aircraft_id)?;
        if !aircraft.is_active {
            return Err(Error::Inactive {
                entity: "aircraft",
                id: aircraft_id,
            });
        }
        Ok(())
    }

    fn check_pilots_usable(&self, operations: &[FlightOperation]) -> Result<()> {
        for operation in operations {
            let pilot = self.require_pilot(operation.pilot_id)?;
            if !pilot.is_active {
                return Err(Error::Inactive {
                    entity: "pilot",
                    id: operation.pilot_id,
                });
            }
        }
        Ok(())
    }

    fn ensure_page_number_unique(&self, page: &PdtPage, exclude_id: Option<i64>) -> Result<()> {
        let count: i64 = self.conn.query_row(
            r"
            SELECT COUNT(*) FROM pdt_pages
            WHERE aircraft_id = ?1 AND page_number = ?2 AND (?3 IS NULL OR id != ?3)
            ",
            params![page.aircraft_id, page.page_number, exclude_id],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(Error::conflict("PDT page", "page_number", &page.page_number));
        }
        Ok(())
    }
}

fn validated_operations(operations: &[FlightOperation]) -> Result<Vec<FlightOperation>> {
    if operations.is_empty() {
        return Err(Error::validation(
            "operations",
            "a PDT page needs at least one flight operation",
        ));
    }
    operations
        .iter()
        .cloned()
        .map(FlightOperation::validated)
        .collect()
}

fn insert_operations(
    tx: &Transaction<'_>,
    page_id: i64,
    operations: &[FlightOperation],
    stamp: &str,
) -> Result<()> {
    let mut stmt = tx.prepare(
        r"
        INSERT INTO flight_operations (pdt_page_id, pilot_id, departure_time,
            departure_location, landing_time, landing_location, number_of_landings,
            flight_time_seconds, engine_hours_after_flight, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
        ",
    )?;
    for operation in operations {
        let flight_time = operation.resolved_flight_time();
        stmt.execute(params![
            page_id,
            operation.pilot_id,
            time_to_sql(operation.departure_time),
            operation.departure_location,
            time_to_sql(operation.landing_time),
            operation.landing_location,
            operation.number_of_landings,
            flight_time.num_seconds(),
            operation.engine_hours_after_flight,
            stamp,
        ])?;
        debug!(
            "Logged {} -> {} on page {} ({}s)",
            operation.departure_location,
            operation.landing_location,
            page_id,
            flight_time.num_seconds()
        );
    }
    Ok(())
}

fn row_to_page(row: &Row<'_>) -> rusqlite::Result<PdtPage> {
    Ok(PdtPage {
        id: Some(row.get(0)?),
        aircraft_id: row.get(1)?,
        pdt_date: date_column(row, 2)?,
        page_number: row.get(3)?,
        persons_on_board: row.get(4)?,
        fuel_added: row.get(5)?,
        fuel_at_start: row.get(6)?,
        oil_added: row.get(7)?,
        oil_at_start: row.get(8)?,
        last_operation_notes: row.get(9)?,
        created_at: Some(timestamp_column(row, 10)?),
        updated_at: Some(timestamp_column(row, 11)?),
    })
}

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<PageListing> {
    Ok(PageListing {
        page: row_to_page(row)?,
        registration_marks: row.get(12)?,
        operation_count: row.get(13)?,
        total_flight_time: Duration::seconds(row.get(14)?),
    })
}

fn row_to_operation(row: &Row<'_>) -> rusqlite::Result<FlightOperation> {
    Ok(FlightOperation {
        id: Some(row.get(0)?),
        pdt_page_id: Some(row.get(1)?),
        pilot_id: row.get(2)?,
        departure_time: time_column(row, 3)?,
        departure_location: row.get(4)?,
        landing_time: time_column(row, 5)?,
        landing_location: row.get(6)?,
        number_of_landings: row.get(7)?,
        flight_time: Some(Duration::seconds(row.get(8)?)),
        engine_hours_after_flight: row.get(9)?,
        created_at: Some(timestamp_column(row, 10)?),
        updated_at: Some(timestamp_column(row, 11)?),
    })
}
