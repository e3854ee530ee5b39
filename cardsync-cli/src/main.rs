//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::error::Error as _;

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    if let Err(err) = cardsync_cli::run() {
        if let cardsync_cli::CliError::ArgumentParsing(clap_error) = err {
            clap_error.exit();
        }
        eprintln!("cardsync: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

/// Install a stderr subscriber; `RUST_LOG` overrides the `info` default.
/// Records from the `log` facade used by the library crates are bridged.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
