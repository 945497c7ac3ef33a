//! `pdtlog` - CLI for aircraft, pilot and PDT flight-log records
//!
//! This binary loads configuration, opens the database and dispatches to the
//! command handlers.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::{debug, info};

use pdtlog::cli::{
    render_aircraft_list, render_aircraft_summary, render_dashboard, render_expiry,
    render_page_detail, render_page_list, render_pilot_list, render_pilot_summary,
    AircraftCommand, CalcCommand, Cli, Command, ConfigCommand, DisplayArgs, OutputFormat,
    PdtCommand, PilotCommand, StatusCommand,
};
use pdtlog::compute::{flight_time, format_duration};
use pdtlog::report::{
    AircraftStatusRow, AircraftSummary, Dashboard, PageDetail, PilotStatusRow, PilotSummary,
};
use pdtlog::storage::PdtFilter;
use pdtlog::{init_logging, Config, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Aircraft(cmd) => handle_aircraft(&config, cmd),
        Command::Pilot(cmd) => handle_pilot(&config, cmd),
        Command::Pdt(cmd) => handle_pdt(&config, cmd),
        Command::Calc(cmd) => {
            handle_calc(&config, &cmd);
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    debug!("Using database {}", path.display());
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn format_or(config: &Config, format: Option<OutputFormat>) -> OutputFormat {
    format.unwrap_or(config.output.format)
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let dashboard = Dashboard::build(&storage, &config.expiry, today_or(cmd.today))?;
    println!("{}", render_dashboard(&dashboard, cmd.json)?);
    Ok(())
}

fn handle_aircraft(config: &Config, cmd: AircraftCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        AircraftCommand::Add(add) => {
            let aircraft = add.into_aircraft();
            let registration = aircraft.registration_marks.clone();
            let id = storage
                .insert_aircraft(&aircraft)
                .with_context(|| format!("failed to add aircraft {registration}"))?;
            info!("Added aircraft {registration} as {id}");
            println!("Added aircraft {id}: {registration}");
        }
        AircraftCommand::Edit(edit) => {
            let id = edit.id;
            let mut aircraft = storage.require_aircraft(id)?;
            edit.apply(&mut aircraft);
            storage
                .update_aircraft(id, &aircraft)
                .with_context(|| format!("failed to update aircraft {id}"))?;
            println!("Updated aircraft {id}: {}", aircraft.registration_marks);
        }
        AircraftCommand::List { all, display } => {
            let DisplayArgs { format, today } = display;
            let rows = AircraftStatusRow::from_list(
                storage.list_aircraft(!all)?,
                &config.expiry,
                today_or(today),
            );
            println!("{}", render_aircraft_list(&rows, format_or(config, format))?);
        }
        AircraftCommand::Show { id, display } => {
            let summary =
                AircraftSummary::build(&storage, id, &config.expiry, today_or(display.today))?;
            println!(
                "{}",
                render_aircraft_summary(&summary, format_or(config, display.format))?
            );
        }
    }
    Ok(())
}

fn handle_pilot(config: &Config, cmd: PilotCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        PilotCommand::Add(add) => {
            let pilot = add.into_pilot();
            let name = pilot.full_name();
            let id = storage
                .insert_pilot(&pilot)
                .with_context(|| format!("failed to add pilot {name}"))?;
            info!("Added pilot {name} as {id}");
            println!("Added pilot {id}: {name}");
        }
        PilotCommand::Edit(edit) => {
            let id = edit.id;
            let mut pilot = storage.require_pilot(id)?;
            edit.apply(&mut pilot);
            storage
                .update_pilot(id, &pilot)
                .with_context(|| format!("failed to update pilot {id}"))?;
            println!("Updated pilot {id}: {}", pilot.full_name());
        }
        PilotCommand::List { all, display } => {
            let DisplayArgs { format, today } = display;
            let rows = PilotStatusRow::from_list(
                storage.list_pilots(!all)?,
                &config.expiry,
                today_or(today),
            );
            println!("{}", render_pilot_list(&rows, format_or(config, format))?);
        }
        PilotCommand::Show { id, display } => {
            let summary =
                PilotSummary::build(&storage, id, &config.expiry, today_or(display.today))?;
            println!(
                "{}",
                render_pilot_summary(&summary, format_or(config, display.format))?
            );
        }
    }
    Ok(())
}

fn handle_pdt(config: &Config, cmd: PdtCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        PdtCommand::Add(add) => {
            let (page, operations) = add.into_parts();
            let id = storage
                .insert_pdt_page(&page, &operations)
                .with_context(|| format!("failed to add PDT page {}", page.page_number))?;
            info!("Added PDT page {} as {id}", page.page_number);
            println!(
                "Added PDT page {id}: {} with {} operation(s)",
                page.page_number,
                operations.len()
            );
        }
        PdtCommand::Edit(edit) => {
            let id = edit.id;
            let mut page = storage.require_pdt_page(id)?;
            let operations = edit.apply(&mut page);
            storage
                .update_pdt_page(id, &page, operations.as_deref())
                .with_context(|| format!("failed to update PDT page {id}"))?;
            println!("Updated PDT page {id}: {}", page.page_number);
        }
        PdtCommand::List {
            aircraft,
            from,
            to,
            format,
        } => {
            let filter = PdtFilter {
                aircraft_id: aircraft,
                date_from: from,
                date_to: to,
            };
            let pages = storage.list_pdt_pages(&filter)?;
            println!("{}", render_page_list(&pages, format_or(config, format))?);
        }
        PdtCommand::Show { id, format } => {
            let detail = PageDetail::build(&storage, id)?;
            println!("{}", render_page_detail(&detail, format_or(config, format))?);
        }
    }
    Ok(())
}

fn handle_calc(config: &Config, cmd: &CalcCommand) {
    match *cmd {
        CalcCommand::FlightTime { departure, landing } => {
            println!("{}", format_duration(flight_time(departure, landing)));
        }
        CalcCommand::Expiry { date, today } => {
            let band = config.expiry.classify(date, today_or(today));
            println!("{}", render_expiry(date, band));
        }
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Expiry]");
                println!("  OK beyond:      {} months", config.expiry.ok_months);
                println!("  Warning beyond: {} months", config.expiry.warning_months);
                println!();
                println!("[Output]");
                println!("  Format:         {:?}", config.output.format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
