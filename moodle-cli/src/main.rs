//! Moodle CLI - Command-line interface for the Moodle web-service API

mod cli;
mod config;
mod error;
mod executor;
mod output;

use clap::Parser;
use cli::{Args, Command};
use config::Config;
use executor::Outcome;
use moodle_ws_client::{Credentials, MoodleApi};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr; RUST_LOG overrides the -v level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the command succeeded
fn run(args: Args) -> Result<bool, error::CliError> {
    let outcome = match args.command {
        // Listing the catalog needs no credentials
        Command::Functions => Outcome::Functions,
        _ => {
            let config = Config::from_args(&args)?;
            tracing::debug!(path = %config.credentials_path.display(), "loading credentials");
            let credentials = Credentials::load(&config.credentials_path)?;

            let api = MoodleApi::builder(credentials)
                .timeout(config.timeout)
                .accept_invalid_certs(config.insecure)
                .build()?;

            executor::execute(&api, args.command)?
        }
    };

    println!("{}", output::render(&outcome)?);
    Ok(outcome.is_success())
}
