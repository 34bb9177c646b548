//! Bayesian CLI binary.

use std::io::Write;
use std::process;

use bayesian::cli::{args::*, commands::*};
use clap::Parser;
use env_logger::{Builder, Env};

fn main() {
    let args = BayesianArgs::parse();

    // RUST_LOG, when set, takes precedence over the verbosity flags.
    let default_level = match args.verbosity() {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
