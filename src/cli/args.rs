//! Defines the command-line arguments and subcommands for the parsegraph CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "parsegraph",
    version,
    about = "Run grammars described as data against text."
)]
pub struct ParsegraphArgs {
    /// Log engine activity to stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match a rule against input and print the outcome as JSON.
    Parse {
        /// Grammar file (.json, .yaml/.yml, anything else is notation).
        #[arg(required = true)]
        grammar: PathBuf,
        /// Name of the rule to run.
        #[arg(required = true)]
        rule: String,
        /// Input text. Without --input or --file, stdin is read.
        #[arg(long, conflicts_with = "file")]
        input: Option<String>,
        /// Read the input from a file.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Fail unless the whole input is consumed.
        #[arg(long)]
        complete: bool,
        /// Pretty-print the JSON outcome.
        #[arg(long)]
        pretty: bool,
    },
    /// Compile a grammar and list its rules.
    Check {
        /// Grammar file to check.
        #[arg(required = true)]
        grammar: PathBuf,
    },
}
