//! The parsegraph Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as _;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, ParsegraphArgs};
use crate::engine::Parser;
use crate::errors::{print_error, ErrorKind, GrammarError, Result};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = ParsegraphArgs::parse();
    init_logging(args.verbose);

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Parse {
            grammar,
            rule,
            input,
            file,
            complete,
            pretty,
        } => handle_parse(&grammar, &rule, input, file, complete, pretty),
        Command::Check { grammar } => handle_check(&grammar),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(2);
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Handles the `parse` subcommand. `Ok(false)` means the rule did not match.
fn handle_parse(
    grammar: &Path,
    rule: &str,
    input: Option<String>,
    file: Option<PathBuf>,
    complete: bool,
    pretty: bool,
) -> Result<bool> {
    let parser = Parser::from_file(grammar)?;
    let (source_name, text) = read_input(input, file)?;
    debug!(rule, source = %source_name, bytes = text.len(), "parsing input");

    let outcome = parser.run(rule, &text)?;
    output::print_outcome(&outcome, pretty);

    let accepted = if complete {
        outcome.is_complete(&text)
    } else {
        outcome.success
    };
    if !accepted {
        output::report_mismatch(&source_name, &text, rule, &outcome);
    }
    Ok(accepted)
}

/// Handles the `check` subcommand.
fn handle_check(grammar: &Path) -> Result<bool> {
    let parser = Parser::from_file(grammar)?;
    output::print_rules(parser.rule_names());
    Ok(true)
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> Result<(String, String)> {
    if let Some(text) = input {
        return Ok(("input".into(), text));
    }
    let io_error = |path: &str, e: std::io::Error| {
        GrammarError::new(ErrorKind::Io {
            path: path.into(),
            message: e.to_string(),
        })
    };
    match file {
        Some(path) => {
            let name = path.display().to_string();
            let text = std::fs::read_to_string(&path).map_err(|e| io_error(&name, e))?;
            Ok((name, text))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| io_error("<stdin>", e))?;
            Ok(("<stdin>".into(), text))
        }
    }
}
