//! parsegraph: grammars as data, compiled into a backtracking parser.
//!
//! A grammar is a set of named [`NodeDescription`]s: patterns, sequences,
//! ordered choices, bounded repetitions, and references to other rules. It can
//! be written in code, in JSON/YAML, or in the textual [`notation`].
//! [`Parser::compile`] turns it into an immutable rule registry, and
//! [`Parser::run`] matches one rule against an input string.

pub use crate::engine::{ParseOutcome, Parser, ParserConfig, TypedOutcome, DEFAULT_MAX_DEPTH};
pub use crate::errors::{ErrorCategory, ErrorKind, GrammarError, Result};
pub use crate::grammar::{
    load_grammar_file, pattern, rule, seq, Choice, Definitions, GrammarFormat, NestingMode,
    NodeDescription, Repeat, RuleRef, Sequence,
};
pub use crate::notation::parse_notation;
pub use crate::value::Value;

pub mod cli;
pub mod coerce;
pub mod engine;
pub mod errors;
pub mod grammar;
pub mod notation;
pub mod value;
