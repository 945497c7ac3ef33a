//! Turning summaries into terminal output.
//!
//! Three formats: `plain` lines with urgency markers, `table` via tabled,
//! and pretty `json`.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::compute::{format_duration, UrgencyBand};
use crate::error::Result;
use crate::model::{LoggedOperation, PageListing};
use crate::report::{
    AircraftStatusRow, AircraftSummary, Dashboard, PageDetail, PilotStatusRow, PilotSummary,
};

/// Output format for `list` and `show` commands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per record.
    #[default]
    Plain,
    /// Bordered table.
    Table,
    /// Pretty-printed JSON.
    Json,
}

fn date_cell(date: Option<NaiveDate>, band: UrgencyBand) -> String {
    match date {
        Some(d) => format!("{d}{}", band.marker()),
        None => "-".to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn to_table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.with(Alignment::left());
    table.to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Tabled)]
struct AircraftRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Registration")]
    registration: String,
    #[tabled(rename = "Type")]
    model: String,
    #[tabled(rename = "Next service")]
    next_service: String,
    #[tabled(rename = "ARC")]
    arc: String,
    #[tabled(rename = "Insurance")]
    insurance: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&AircraftStatusRow> for AircraftRow {
    fn from(row: &AircraftStatusRow) -> Self {
        let a = &row.aircraft;
        Self {
            id: a.id.map(|id| id.to_string()).unwrap_or_default(),
            registration: a.registration_marks.clone(),
            model: format!("{} {}", a.manufacturer, a.aircraft_type),
            next_service: date_cell(a.next_service_date, row.statuses.next_service),
            arc: date_cell(a.arc_valid_until, row.statuses.arc),
            insurance: date_cell(a.insurance_valid_until, row.statuses.insurance),
            active: yes_no(a.is_active).to_string(),
        }
    }
}

fn aircraft_line(row: &AircraftStatusRow) -> String {
    let r = AircraftRow::from(row);
    let mut line = format!(
        "[{}] {} {}  service {}  ARC {}  insurance {}",
        r.id, r.registration, r.model, r.next_service, r.arc, r.insurance
    );
    if !row.aircraft.is_active {
        line.push_str("  (inactive)");
    }
    line
}

/// Render the aircraft list.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_aircraft_list(rows: &[AircraftStatusRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(rows),
        OutputFormat::Table => Ok(to_table(rows.iter().map(AircraftRow::from).collect())),
        OutputFormat::Plain => {
            if rows.is_empty() {
                return Ok("No aircraft.".to_string());
            }
            Ok(rows
                .iter()
                .map(aircraft_line)
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Page")]
    page: String,
    #[tabled(rename = "Aircraft")]
    aircraft: String,
    #[tabled(rename = "Pilot")]
    pilot: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Off")]
    departure: String,
    #[tabled(rename = "On")]
    landing: String,
    #[tabled(rename = "Time")]
    flight_time: String,
    #[tabled(rename = "Ldg")]
    landings: u16,
}

impl From<&LoggedOperation> for OperationRow {
    fn from(logged: &LoggedOperation) -> Self {
        let op = &logged.operation;
        Self {
            date: logged.pdt_date,
            page: logged.page_number.clone(),
            aircraft: logged.registration_marks.clone(),
            pilot: logged.pilot_name.clone(),
            route: format!("{}-{}", op.departure_location, op.landing_location),
            departure: op.departure_time.format("%H:%M").to_string(),
            landing: op.landing_time.format("%H:%M").to_string(),
            flight_time: format_duration(logged.flight_time()),
            landings: op.number_of_landings,
        }
    }
}

/// Trailing section listing recent operations, preceded by a blank line.
fn operation_lines(operations: &[LoggedOperation], format: OutputFormat) -> Vec<String> {
    if operations.is_empty() {
        return vec![String::new(), "No operations logged.".to_string()];
    }
    let mut lines = vec![String::new(), "Recent operations:".to_string()];
    if format == OutputFormat::Table {
        lines.push(to_table(operations.iter().map(OperationRow::from).collect()));
        return lines;
    }
    lines.extend(operations.iter().map(OperationRow::from).map(|r| {
        format!(
            "  {} PDT {} {} {} {} {}-{} {} ({} ldg)",
            r.date,
            r.page,
            r.aircraft,
            r.pilot,
            r.route,
            r.departure,
            r.landing,
            r.flight_time,
            r.landings
        )
    }));
    lines
}

/// Render one aircraft with totals and recent operations.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_aircraft_summary(summary: &AircraftSummary, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(summary);
    }

    let a = &summary.aircraft;
    let s = &summary.statuses;
    let engine_hours = summary
        .max_engine_hours
        .map_or_else(|| "-".to_string(), |h| format!("{h:.1}"));
    let service_hours = a
        .next_service_hours
        .map_or_else(|| "-".to_string(), |h| h.to_string());

    let mut lines = vec![
        a.to_string(),
        format!("  Serial number:   {}", a.serial_number),
        format!("  Active:          {}", yes_no(a.is_active)),
        format!(
            "  Flight time:     {}",
            format_duration(summary.total_flight_time)
        ),
        format!("  Landings:        {}", summary.total_landings),
        format!("  Engine hours:    {engine_hours}"),
        format!(
            "  Next service:    {} / {service_hours}",
            date_cell(a.next_service_date, s.next_service)
        ),
        format!("  ARC valid until: {}", date_cell(a.arc_valid_until, s.arc)),
        format!(
            "  Insurance until: {}",
            date_cell(a.insurance_valid_until, s.insurance)
        ),
    ];
    lines.extend(operation_lines(&summary.recent_operations, format));
    Ok(lines.join("\n"))
}

#[derive(Tabled)]
struct PilotRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Licence")]
    license: String,
    #[tabled(rename = "SEP(L)")]
    sepl: String,
    #[tabled(rename = "Medical")]
    medical: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&PilotStatusRow> for PilotRow {
    fn from(row: &PilotStatusRow) -> Self {
        let p = &row.pilot;
        Self {
            id: p.id.map(|id| id.to_string()).unwrap_or_default(),
            name: p.full_name(),
            license: p.license_number.clone(),
            sepl: date_cell(p.sepl_valid_until, row.statuses.sepl),
            medical: date_cell(p.medical_valid_until, row.statuses.medical),
            active: yes_no(p.is_active).to_string(),
        }
    }
}

/// Render the pilot list.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_pilot_list(rows: &[PilotStatusRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(rows),
        OutputFormat::Table => Ok(to_table(rows.iter().map(PilotRow::from).collect())),
        OutputFormat::Plain => {
            if rows.is_empty() {
                return Ok("No pilots.".to_string());
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    let r = PilotRow::from(row);
                    let mut line = format!(
                        "[{}] {} ({})  SEP(L) {}  medical {}",
                        r.id, r.name, r.license, r.sepl, r.medical
                    );
                    if !row.pilot.is_active {
                        line.push_str("  (inactive)");
                    }
                    line
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// Render one pilot with totals and recent operations.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_pilot_summary(summary: &PilotSummary, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(summary);
    }

    let p = &summary.pilot;
    let mut lines = vec![
        p.to_string(),
        format!("  Username:     {}", p.username),
        format!("  Licence:      {}", p.license_number),
        format!("  Phone:        {}", p.phone_number),
        format!("  E-mail:       {}", p.email.as_deref().unwrap_or("-")),
        format!("  Active:       {}", yes_no(p.is_active)),
        format!("  Flights:      {}", summary.totals.flights),
        format!("  Landings:     {}", summary.totals.landings),
        format!(
            "  SEP(L) until: {}",
            date_cell(p.sepl_valid_until, summary.statuses.sepl)
        ),
        format!(
            "  Medical until: {}",
            date_cell(p.medical_valid_until, summary.statuses.medical)
        ),
    ];
    lines.extend(operation_lines(&summary.recent_operations, format));
    Ok(lines.join("\n"))
}

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Page")]
    page: String,
    #[tabled(rename = "Aircraft")]
    aircraft: String,
    #[tabled(rename = "Ops")]
    operations: u32,
    #[tabled(rename = "Time")]
    flight_time: String,
}

impl From<&PageListing> for PageRow {
    fn from(listing: &PageListing) -> Self {
        Self {
            id: listing.page.id.map(|id| id.to_string()).unwrap_or_default(),
            date: listing.page.pdt_date,
            page: listing.page.page_number.clone(),
            aircraft: listing.registration_marks.clone(),
            operations: listing.operation_count,
            flight_time: format_duration(listing.total_flight_time),
        }
    }
}

fn page_lines(pages: &[PageListing]) -> String {
    pages
        .iter()
        .map(|listing| {
            let r = PageRow::from(listing);
            format!(
                "[{}] {listing}  {} ops  {}",
                r.id, r.operations, r.flight_time
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a list of PDT pages.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_page_list(pages: &[PageListing], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(pages),
        OutputFormat::Table => Ok(to_table(pages.iter().map(PageRow::from).collect())),
        OutputFormat::Plain if pages.is_empty() => Ok("No PDT pages.".to_string()),
        OutputFormat::Plain => Ok(page_lines(pages)),
    }
}

#[derive(Tabled)]
struct PageOperationRow {
    #[tabled(rename = "Pilot")]
    pilot: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Off")]
    departure: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "On")]
    landing: String,
    #[tabled(rename = "Time")]
    flight_time: String,
    #[tabled(rename = "Ldg")]
    landings: u16,
    #[tabled(rename = "Engine h")]
    engine_hours: String,
}

/// Render one PDT page with its operations.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_page_detail(detail: &PageDetail, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(detail);
    }

    let page = &detail.page;
    let rows: Vec<PageOperationRow> = detail
        .operations
        .iter()
        .map(|entry| {
            let op = &entry.operation;
            PageOperationRow {
                pilot: entry.pilot_name.clone(),
                from: op.departure_location.clone(),
                departure: op.departure_time.format("%H:%M").to_string(),
                to: op.landing_location.clone(),
                landing: op.landing_time.format("%H:%M").to_string(),
                flight_time: format_duration(op.resolved_flight_time()),
                landings: op.number_of_landings,
                engine_hours: format!("{:.1}", op.engine_hours_after_flight),
            }
        })
        .collect();

    let mut lines = vec![
        format!(
            "PDT {} - {} ({})",
            page.page_number, detail.registration_marks, page.pdt_date
        ),
        format!("  Persons on board: {}", page.persons_on_board),
        format!(
            "  Fuel: {:.1} at start, {:.1} added",
            page.fuel_at_start, page.fuel_added
        ),
        format!(
            "  Oil:  {:.1} at start, {:.1} added",
            page.oil_at_start, page.oil_added
        ),
    ];
    if !page.last_operation_notes.is_empty() {
        lines.push(format!("  Notes: {}", page.last_operation_notes));
    }
    lines.push(format!(
        "  Total: {} in {} landings",
        format_duration(detail.total_flight_time),
        detail.total_landings
    ));

    if format == OutputFormat::Table {
        lines.push(to_table(rows));
    } else {
        lines.extend(rows.iter().map(|r| {
            format!(
                "  {} {} {} -> {} {}  {}  {} ldg  {} eh",
                r.pilot,
                r.from,
                r.departure,
                r.to,
                r.landing,
                r.flight_time,
                r.landings,
                r.engine_hours
            )
        }));
    }
    Ok(lines.join("\n"))
}

/// Render the `status` overview.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_dashboard(dashboard: &Dashboard, json: bool) -> Result<String> {
    if json {
        return to_json(dashboard);
    }

    let stats = &dashboard.stats;
    #[allow(clippy::cast_precision_loss)]
    let size_kb = stats.db_size_bytes as f64 / 1024.0;
    let mut lines = vec![
        format!("pdtlog status as of {}", dashboard.today),
        format!("  PDT pages:         {}", stats.pdt_pages),
        format!("  Flight operations: {}", stats.flight_operations),
        format!("  Active aircraft:   {}", stats.active_aircraft),
        format!("  Active pilots:     {}", stats.active_pilots),
        format!("  Database size:     {size_kb:.1} KB"),
        String::new(),
        "Recent PDT pages:".to_string(),
    ];
    if dashboard.recent_pages.is_empty() {
        lines.push("  none".to_string());
    } else {
        lines.extend(
            page_lines(&dashboard.recent_pages)
                .lines()
                .map(|line| format!("  {line}")),
        );
    }

    lines.push(String::new());
    lines.push("Aircraft:".to_string());
    if dashboard.active_aircraft.is_empty() {
        lines.push("  none".to_string());
    } else {
        lines.extend(
            dashboard
                .active_aircraft
                .iter()
                .map(|row| format!("  {}", aircraft_line(row))),
        );
    }
    Ok(lines.join("\n"))
}

/// Render the result of `calc expiry`.
#[must_use]
pub fn render_expiry(date: Option<NaiveDate>, band: UrgencyBand) -> String {
    match date {
        Some(d) => format!("{d}: {band}{}", band.marker()),
        None => format!("no date: {band}"),
    }
}
