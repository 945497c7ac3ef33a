//! Storage layer for pdtlog.
//!
//! `SQLite`-backed persistence for aircraft, pilots, PDT pages and their
//! flight operations. Record-specific queries live in the submodules as
//! further `impl Storage` blocks.

mod aircraft;
pub mod migrations;
mod pages;
mod pilots;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use aircraft::AircraftTotals;
pub use pages::PdtFilter;
pub use pilots::PilotTotals;

/// Number of operations returned by the per-aircraft and per-pilot histories.
pub const HISTORY_LIMIT: usize = 20;

/// Format used for clock times in the database.
const TIME_FORMAT: &str = "%H:%M:%S";

/// Format used for calendar dates in the database.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage engine for flight records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record counts for the dashboard and `status` output.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (pdt_pages, active_aircraft, active_pilots, flight_operations): (i64, i64, i64, i64) =
            self.conn.query_row(
                r"
                SELECT
                    (SELECT COUNT(*) FROM pdt_pages),
                    (SELECT COUNT(*) FROM aircraft WHERE is_active = 1),
                    (SELECT COUNT(*) FROM pilots WHERE is_active = 1),
                    (SELECT COUNT(*) FROM flight_operations)
                ",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            pdt_pages,
            active_aircraft,
            active_pilots,
            flight_operations,
            db_size_bytes,
        })
    }

    /// Fail with [`Error::Conflict`] if another row of `table` already holds
    /// `value` in `column`. `exclude_id` skips the row being updated.
    fn ensure_unique(
        &self,
        table: &'static str,
        entity: &'static str,
        column: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<()> {
        let sql =
            format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1 AND (?2 IS NULL OR id != ?2)");
        let count: i64 = self
            .conn
            .query_row(&sql, rusqlite::params![value, exclude_id], |row| row.get(0))?;
        if count > 0 {
            debug!("Rejecting duplicate {} {} '{}'", entity, column, value);
            return Err(Error::conflict(entity, column, value));
        }
        Ok(())
    }
}

/// Record counts in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// All PDT pages.
    pub pdt_pages: i64,
    /// Aircraft marked active.
    pub active_aircraft: i64,
    /// Pilots marked active.
    pub active_pilots: i64,
    /// All logged flight operations.
    pub flight_operations: i64,
    /// Size of the database file in bytes; zero in memory.
    pub db_size_bytes: u64,
}

/// Fixed-width UTC timestamp, so text order is time order.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn time_to_sql(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn conversion_failure(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_failure(idx, e))
}

fn opt_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| NaiveDate::parse_from_str(&t, DATE_FORMAT).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let text: String = row.get(idx)?;
    NaiveTime::parse_from_str(&text, TIME_FORMAT).map_err(|e| conversion_failure(idx, e))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime};

    use super::*;
    use crate::model::{Aircraft, FlightOperation, PdtPage, Pilot};

    pub(crate) fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub(crate) fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    pub(crate) fn add_aircraft(storage: &Storage, registration: &str) -> i64 {
        let serial = format!("SN-{registration}");
        storage
            .insert_aircraft(&Aircraft::new("Cessna", "172S", serial, registration))
            .unwrap()
    }

    pub(crate) fn add_pilot(storage: &Storage, username: &str, last_name: &str) -> i64 {
        let license = format!("PL.FCL.{username}");
        storage
            .insert_pilot(&Pilot::new("Jan", last_name, username, license, "600100200"))
            .unwrap()
    }

    /// One page with a single operation of `minutes` flight time.
    pub(crate) fn add_page(
        storage: &Storage,
        aircraft_id: i64,
        pilot_id: i64,
        page_number: &str,
        date: NaiveDate,
        minutes: i64,
    ) -> i64 {
        let mut op = FlightOperation::new(pilot_id, hm(10, 0), "EPWA", hm(11, 0), "EPKK");
        op.flight_time = Some(Duration::minutes(minutes));
        storage
            .insert_pdt_page(&PdtPage::new(aircraft_id, date, page_number, 1), &[op])
            .unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let storage = create_test_storage();
        let result = storage.conn.execute(
            r"
            INSERT INTO pdt_pages (aircraft_id, pdt_date, page_number, persons_on_board,
                fuel_added, fuel_at_start, oil_added, oil_at_start, created_at, updated_at)
            VALUES (999, '2025-06-15', '1', 1, 0, 0, 0, 0, 'x', 'x')
            ",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.pdt_pages, 0);
        assert_eq!(stats.active_aircraft, 0);
        assert_eq!(stats.active_pilots, 0);
        assert_eq!(stats.flight_operations, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_counts_only_active() {
        let storage = create_test_storage();
        let aircraft_id = add_aircraft(&storage, "SP-ABC");
        let pilot_id = add_pilot(&storage, "jk", "Kowalski");
        add_page(&storage, aircraft_id, pilot_id, "1", ymd(2025, 6, 15), 60);

        let mut retired = Aircraft::new("Piper", "PA-28", "28-1", "SP-OLD");
        retired.is_active = false;
        storage.insert_aircraft(&retired).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.pdt_pages, 1);
        assert_eq!(stats.active_aircraft, 1);
        assert_eq!(stats.active_pilots, 1);
        assert_eq!(stats.flight_operations, 1);
    }

    #[test]
    fn test_open_file_based() {
        let db_path =
            std::env::temp_dir().join(format!("pdtlog_test_{}.db", std::process::id()));

        let storage = Storage::open(&db_path).unwrap();
        add_aircraft(&storage, "SP-FIL");
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.list_aircraft(false).unwrap().len(), 1);

        drop(reopened);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("pdtlog_nested_{}", std::process::id()));
        let nested_path = root.join("nested/pdtlog.db");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_open_reports_directory_create_failure() {
        let blocker =
            std::env::temp_dir().join(format!("pdtlog_blocker_{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = Storage::open(blocker.join("sub/pdtlog.db")).unwrap_err();
        assert!(matches!(err, Error::DirectoryCreate { .. }));

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn test_bad_date_text_is_a_query_error() {
        let storage = create_test_storage();
        let id = add_aircraft(&storage, "SP-BAD");
        storage
            .conn
            .execute(
                "UPDATE aircraft SET arc_valid_until = 'soon' WHERE id = ?1",
                [id],
            )
            .unwrap();

        let err = storage.get_aircraft(id).unwrap_err();
        assert!(matches!(err, Error::DatabaseQuery(_)));
    }
}
