// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # ModuleFlow CLI
//!
//! This is the main entry point for the ModuleFlow command-line interface.
//! It initializes the logger and runs the selected command.

use anyhow::Context;
use log::LevelFilter;
use moduleflow::cli;

/// Maps the number of `-v` flags to a log level. `RUST_LOG` still wins
/// when set.
fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();
    init_logger(matches.get_count("verbose"));
    cli::execute(&matches).context("moduleflow failed")
}

/// The main entry point for the ModuleFlow CLI.
fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
