use cert_recon::args::{Args, Command};
use cert_recon::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.master(), init_args.models())?.print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home)?;
            commands::report(&config, report_args)?.print()
        }

        Command::Lookup(lookup_args) => {
            let config = Config::load(home)?;
            commands::lookup(&config, lookup_args.code())?.print()
        }

        Command::Codes(codes_args) => {
            let config = Config::load(home)?;
            commands::codes(&config, codes_args)?.print()
        }

        Command::Manual(manual_args) => {
            let config = Config::load(home)?;
            commands::manual(&config, manual_args)?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let level = level.to_string().to_lowercase();
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "cert_recon",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
