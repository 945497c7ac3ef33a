//! `SQLite` schema definitions for pdtlog.
//!
//! Dates are stored as `YYYY-MM-DD` text, clock times as `HH:MM:SS` text and
//! timestamps as RFC 3339 text, so lexical order matches time order.

/// SQL statement to create the aircraft table.
pub const CREATE_AIRCRAFT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS aircraft (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer TEXT NOT NULL,
    aircraft_type TEXT NOT NULL,
    serial_number TEXT NOT NULL UNIQUE,
    registration_marks TEXT NOT NULL UNIQUE,
    base_flight_minutes INTEGER NOT NULL DEFAULT 0 CHECK (base_flight_minutes >= 0),
    base_landings INTEGER NOT NULL DEFAULT 0 CHECK (base_landings >= 0),
    next_service_date TEXT,
    next_service_minutes INTEGER CHECK (next_service_minutes >= 0),
    arc_valid_until TEXT,
    insurance_valid_until TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// SQL statement to create the pilots table.
pub const CREATE_PILOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS pilots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    username TEXT NOT NULL UNIQUE,
    license_number TEXT NOT NULL UNIQUE,
    phone_number TEXT NOT NULL,
    sepl_valid_until TEXT,
    medical_valid_until TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// SQL statement to create the PDT pages table.
pub const CREATE_PDT_PAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS pdt_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    aircraft_id INTEGER NOT NULL REFERENCES aircraft(id) ON DELETE RESTRICT,
    pdt_date TEXT NOT NULL,
    page_number TEXT NOT NULL,
    persons_on_board INTEGER NOT NULL CHECK (persons_on_board >= 1),
    fuel_added REAL NOT NULL CHECK (fuel_added >= 0),
    fuel_at_start REAL NOT NULL CHECK (fuel_at_start >= 0),
    oil_added REAL NOT NULL CHECK (oil_added >= 0),
    oil_at_start REAL NOT NULL CHECK (oil_at_start >= 0),
    last_operation_notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (aircraft_id, page_number)
)
";

/// SQL statement to create the flight operations table.
pub const CREATE_FLIGHT_OPERATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_operations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pdt_page_id INTEGER NOT NULL REFERENCES pdt_pages(id) ON DELETE RESTRICT,
    pilot_id INTEGER NOT NULL REFERENCES pilots(id) ON DELETE RESTRICT,
    departure_time TEXT NOT NULL,
    departure_location TEXT NOT NULL,
    landing_time TEXT NOT NULL,
    landing_location TEXT NOT NULL,
    number_of_landings INTEGER NOT NULL CHECK (number_of_landings >= 1),
    flight_time_seconds INTEGER NOT NULL CHECK (flight_time_seconds >= 0),
    engine_hours_after_flight REAL NOT NULL CHECK (engine_hours_after_flight >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `pdt_date` for listing pages.
pub const CREATE_PAGE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_pdt_pages_date ON pdt_pages(pdt_date DESC)
";

/// SQL statement to create an index on `aircraft_id` for per-aircraft queries.
pub const CREATE_PAGE_AIRCRAFT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_pdt_pages_aircraft ON pdt_pages(aircraft_id)
";

/// SQL statement to create an index on `pdt_page_id` for loading a page's operations.
pub const CREATE_OPERATION_PAGE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_operations_page ON flight_operations(pdt_page_id)
";

/// SQL statement to create an index on `pilot_id` for per-pilot queries.
pub const CREATE_OPERATION_PILOT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_operations_pilot ON flight_operations(pilot_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_AIRCRAFT_TABLE,
    CREATE_PILOTS_TABLE,
    CREATE_PDT_PAGES_TABLE,
    CREATE_FLIGHT_OPERATIONS_TABLE,
    CREATE_PAGE_DATE_INDEX,
    CREATE_PAGE_AIRCRAFT_INDEX,
    CREATE_OPERATION_PAGE_INDEX,
    CREATE_OPERATION_PILOT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_references_are_restricted() {
        for stmt in [CREATE_PDT_PAGES_TABLE, CREATE_FLIGHT_OPERATIONS_TABLE] {
            for line in stmt.lines().filter(|l| l.contains("REFERENCES")) {
                assert!(line.contains("ON DELETE RESTRICT"), "unrestricted: {line}");
            }
        }
    }

    #[test]
    fn test_page_number_unique_per_aircraft() {
        assert!(CREATE_PDT_PAGES_TABLE.contains("UNIQUE (aircraft_id, page_number)"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
