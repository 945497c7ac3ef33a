//! Command-line interface for pdtlog.
//!
//! This module provides the CLI structure and output rendering for the
//! `pdtlog` binary.

mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AddAircraft, AddPage, AddPilot, AircraftCommand, CalcCommand, ConfigCommand, DisplayArgs,
    EditAircraft, EditPage, EditPilot, PdtCommand, PilotCommand, StatusCommand,
};
pub use render::{
    render_aircraft_list, render_aircraft_summary, render_dashboard, render_expiry,
    render_page_detail, render_page_list, render_pilot_list, render_pilot_summary, OutputFormat,
};

/// pdtlog - Aircraft, pilot and PDT flight-log records
///
/// Keeps the aircraft fleet, the pilot roster and the daily flight-log pages
/// of a small operator, and flags certificates that are about to expire.
#[derive(Debug, Parser)]
#[command(name = "pdtlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show record counts, recent pages and fleet expiry bands
    Status(StatusCommand),

    /// Manage aircraft
    #[command(subcommand)]
    Aircraft(AircraftCommand),

    /// Manage pilots
    #[command(subcommand)]
    Pilot(PilotCommand),

    /// Manage PDT pages and their flight operations
    #[command(subcommand)]
    Pdt(PdtCommand),

    /// Run the flight-time and expiry calculators
    #[command(subcommand)]
    Calc(CalcCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
