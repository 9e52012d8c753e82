//! Command-line driver for the parcel tracker.
//!
//! # Responsibility
//! - Parse flags/env into a database path and logging setup.
//! - Dispatch one use-case call per invocation and print the result.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracker_core::db::open_db;
use tracker_core::{
    default_log_level, init_logging, ClientId, Parcel, ParcelNumber, ParcelService,
    SqliteParcelRepository,
};

#[derive(Debug, Parser)]
#[command(name = "tracker", version, about = "Track parcels through their delivery lifecycle")]
struct Cli {
    /// SQLite database file, created when missing.
    #[arg(long, env = "TRACKER_DB", default_value = "tracker.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "TRACKER_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "TRACKER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print parcels as JSON lines.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new parcel.
    Register {
        #[arg(long)]
        client: ClientId,
        #[arg(long)]
        address: String,
    },
    /// Show one parcel.
    Show { number: ParcelNumber },
    /// List a client's parcels.
    List {
        #[arg(long)]
        client: ClientId,
    },
    /// Advance a parcel to its next status.
    NextStatus { number: ParcelNumber },
    /// Change the address of a registered parcel.
    SetAddress {
        number: ParcelNumber,
        address: String,
    },
    /// Delete a registered parcel.
    Delete { number: ParcelNumber },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(&cli.db)?;
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn)?);

    match &cli.command {
        Command::Register { client, address } => {
            let parcel = service.register(*client, address.as_str())?;
            print_parcel(&parcel, cli.json)?;
        }
        Command::Show { number } => {
            print_parcel(&service.parcel(*number)?, cli.json)?;
        }
        Command::List { client } => {
            for parcel in service.client_parcels(*client)? {
                print_parcel(&parcel, cli.json)?;
            }
        }
        Command::NextStatus { number } => {
            let status = service.next_status(*number)?;
            println!("parcel {number} is now {status}");
        }
        Command::SetAddress { number, address } => {
            service.change_address(*number, address.as_str())?;
            println!("parcel {number} address updated");
        }
        Command::Delete { number } => {
            service.delete(*number)?;
            println!("parcel {number} deleted");
        }
    }

    Ok(())
}

fn print_parcel(parcel: &Parcel, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(parcel)?);
    } else {
        println!(
            "{}\tclient={}\tstatus={}\tcreated_at={}\taddress={}",
            parcel.number, parcel.client, parcel.status, parcel.created_at, parcel.address
        );
    }
    Ok(())
}
