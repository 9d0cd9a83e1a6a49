//! `fieldvault`: command bridge entry point.
//!
//! Startup sequence:
//! 1. Parse the command; argument errors become a JSON failure.
//! 2. Load and validate [`Config`] from environment variables (`keygen` skips this).
//! 3. Initialise structured JSON logging on stderr.
//! 4. Execute the command and print exactly one JSON document on stdout.
//!
//! The exit code is always 0; success or failure travels in the JSON payload.

use fieldvault::bridge::{self, Command, Parsed};
use fieldvault::{telemetry, Config};
use tracing::info;

fn main() {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let command = match bridge::parse(std::env::args_os()) {
        Parsed::Run(command) => command,
        Parsed::Display(help) => {
            let _ = help.print();
            return;
        }
        Parsed::Reject(response) => {
            println!("{response}");
            return;
        }
    };

    if let Command::Keygen = command {
        println!("{}", bridge::render(bridge::keygen()));
        return;
    }

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            println!("{}", bridge::config_failure(&e));
            return;
        }
    };

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("WARN: {e:#}");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = command.name(),
        "fieldvault starting"
    );

    // -----------------------------------------------------------------------
    // 4. Execute
    // -----------------------------------------------------------------------
    println!("{}", bridge::execute(command, &cfg));
}
