// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for ModuleFlow
//!
//! Renders a page source (a JSON or YAML module list) into an HTML document,
//! or reports how each module of a source classifies.
//!
//! # Examples
//!
//! ```
//! use moduleflow::cli;
//!
//! let matches = cli::build().get_matches_from(vec![
//!     "moduleflow",
//!     "render",
//!     "home.json",
//!     "--layout",
//!     "sidebar=1/4",
//! ]);
//!
//! let render = matches.subcommand_matches("render").unwrap();
//! assert_eq!(render.get_one::<String>("auth").unwrap(), "anonymous");
//! ```

use crate::auth::{AuthStatus, StaticAuthGate};
use crate::classify::{classify, Classification};
use crate::core::config::{ConfigBuilder, Profile};
use crate::generators::html::HtmlPageGenerator;
use crate::layout::LayoutOverrides;
use crate::source::load_modules;
use crate::{ModuleFlow, ModuleFlowError, OutputGenerator, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use std::io::{self, Write};
use std::path::PathBuf;

/// The current version of ModuleFlow, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "MODULEFLOW_";

/// Builds and configures the ModuleFlow command-line interface.
pub fn build() -> Command {
    debug!("Building CLI command structure");

    Command::new("moduleflow")
        .author("ModuleFlow Contributors")
        .about("Renders CMS-authored modular pages into laid-out HTML.")
        .version(VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log output (-v, -vv, -vvv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("render")
                .about("Render a page source to HTML")
                .arg(
                    Arg::new("input")
                        .help("Page source (.json, .yaml or .yml)")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the document here instead of stdout")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("TOML configuration file")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("layout")
                        .short('l')
                        .long("layout")
                        .help("Layout override, e.g. sidebar=1/4 or main=wide")
                        .value_parser(parse_layout_arg)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("minify")
                        .short('m')
                        .long("minify")
                        .help("Minify output")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dev")
                        .short('d')
                        .long("dev")
                        .help("Use the development profile (diagnostics for skipped modules)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("auth")
                        .short('a')
                        .long("auth")
                        .help("Authentication status of the viewer")
                        .value_parser(["determining", "authenticated", "anonymous"])
                        .default_value("anonymous"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report how each module of a page source classifies")
                .arg(
                    Arg::new("input")
                        .help("Page source (.json, .yaml or .yml)")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .after_help(
            "\x1b[1;4mLicense:\x1b[0m\n  The project is licensed under the terms of \
             both the MIT license and the Apache License (Version 2.0).",
        )
}

/// Executes the command-line interface by matching the subcommand and arguments.
///
/// # Returns
/// * `Result<()>` - Indicates success, or an error if execution fails.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("render", sub_matches)) => render(sub_matches),
        Some(("check", sub_matches)) => check(sub_matches),
        _ => Err(ModuleFlowError::internal_error("Unknown command")),
    }
}

/// Parses a `bucket=layout` argument.
fn parse_layout_arg(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((bucket, layout))
            if !bucket.trim().is_empty() && !layout.trim().is_empty() =>
        {
            Ok((bucket.trim().to_string(), layout.trim().to_string()))
        }
        _ => Err(format!("expected BUCKET=LAYOUT, got `{}`", value)),
    }
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    matches.get_one::<PathBuf>(name).ok_or_else(|| {
        ModuleFlowError::internal_error(format!("Missing argument `{}`", name))
    })
}

/// Renders a page source into an HTML document.
fn render(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input")?;

    let mut builder = ConfigBuilder::new().with_env_prefix(ENV_PREFIX);
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        builder = builder.with_file(path);
    }
    if matches.get_flag("dev") {
        builder = builder.with_profile(Profile::Development);
    }
    if matches.get_flag("minify") {
        builder = builder.with_override("output.minify", true);
    }
    let config = builder.build()?;
    let config = config.read();

    let auth = matches
        .get_one::<String>("auth")
        .and_then(|name| AuthStatus::from_name(name))
        .unwrap_or(AuthStatus::Anonymous);
    let overrides = LayoutOverrides::from_map(
        matches
            .get_many::<(String, String)>("layout")
            .into_iter()
            .flatten()
            .map(|(bucket, layout)| (bucket.as_str(), layout.as_str())),
    );

    info!("Rendering {:?}", input);
    let modules = load_modules(input)?;
    let flow = ModuleFlow::from_config(&config)?.with_auth_gate(StaticAuthGate(auth));
    let generator = HtmlPageGenerator::new(config.page_options());
    let document = flow.render_document(&modules, &overrides, &generator)?;

    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            generator.generate(&document, path)?;
            info!("Wrote {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Prints one line per module: id, placement and classification.
fn check(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input")?;
    let modules = load_modules(input)?;

    let mut stdout = io::stdout().lock();
    let mut valid = 0;
    for module in &modules {
        let outcome = match classify(module) {
            Classification::Valid(variant) => {
                valid += 1;
                format!("ok {}", variant.tag())
            }
            Classification::Invalid(reason) => format!("skip: {}", reason),
        };
        let gated = if module.is_gated() { " (members only)" } else { "" };
        writeln!(
            stdout,
            "{}\t{}\t{}{}",
            module.id_label(),
            module.placement(),
            outcome,
            gated
        )?;
    }
    writeln!(stdout, "{} of {} modules valid", valid, modules.len())?;
    Ok(())
}
