//! The parser engine: a compiled, immutable rule registry and its run entry points.
//!
//! ## Usage Workflow
//! ```rust
//! use parsegraph::{pattern, seq, Choice, Definitions, Parser};
//! // 1. Describe the grammar as data
//! let defs = Definitions::new()
//!     .define("expr", Choice::new([seq([pattern(r"\("), "expr::".into(), pattern(r"\)")]), pattern("x")]));
//! // 2. Compile it once
//! let parser = Parser::compile(&defs).unwrap();
//! // 3. Run it as often as needed
//! let outcome = parser.run("expr", "((x))").unwrap();
//! assert!(outcome.success);
//! assert!(outcome.is_complete("((x))"));
//! ```
//!
//! ## Registry Invariant
//! A `Parser` never changes after `compile`. It is `Send + Sync`; concurrent runs
//! each own their cursor, so sharing one parser across threads needs no locking.
//!
//! ## Known Limitation
//! Grammars that recurse without consuming input (left recursion, or a choice
//! whose first branch refers back to the choice) never terminate on their own.
//! Every rule reference entered counts towards [`ParserConfig::max_depth`];
//! crossing it aborts the run with a `RecursionLimit` error instead of
//! overflowing the stack.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::coerce;
use crate::errors::{GrammarError, Result};
use crate::grammar::{load_grammar_file, Definitions};
use crate::value::Value;

mod compiler;
mod exec;
mod node;

use exec::{Cursor, Execution};
use node::{Rule, RuleId};

/// Default limit on nested rule references per run.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Settings that apply to every run of a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// How many rule references may be active at once.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    pub success: bool,
    /// Byte offset up to which the grammar matched.
    pub position: usize,
    pub result: Value,
}

impl ParseOutcome {
    /// True when the run succeeded and consumed the whole input.
    pub fn is_complete(&self, input: &str) -> bool {
        self.success && self.position == input.len()
    }
}

/// A run whose result was coerced into `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedOutcome<T> {
    pub success: bool,
    pub position: usize,
    pub result: T,
}

/// A compiled grammar.
#[derive(Debug, Clone)]
pub struct Parser {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
    config: ParserConfig,
}

impl Parser {
    /// Compiles `definitions` with the default configuration.
    pub fn compile(definitions: &Definitions) -> Result<Self> {
        Self::compile_with(definitions, ParserConfig::default())
    }

    /// Compiles `definitions`.
    ///
    /// # Errors
    /// Returns a grammar error if a pattern does not compile, a reference names
    /// a rule that is not defined, or a description is structurally invalid.
    pub fn compile_with(definitions: &Definitions, config: ParserConfig) -> Result<Self> {
        let compiled = compiler::compile_rules(definitions)?;
        debug!(rules = compiled.rules.len(), max_depth = config.max_depth, "compiled grammar");
        Ok(Parser {
            rules: compiled.rules,
            index: compiled.index,
            config,
        })
    }

    /// Loads and compiles grammar text in the textual notation.
    pub fn from_notation(text: &str) -> Result<Self> {
        Self::compile(&crate::notation::parse_notation(text)?)
    }

    /// Loads and compiles a grammar file (JSON, YAML, or notation by extension).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::compile(&load_grammar_file(path)?)
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Rule names in registry order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Matches rule `rule` against `input`, starting at offset 0.
    ///
    /// A failed match is an `Ok` outcome with `success == false`.
    ///
    /// # Errors
    /// `UnknownRule` if `rule` is not defined, `RecursionLimit` if the run nests
    /// deeper than the configured `max_depth`.
    pub fn run(&self, rule: &str, input: &str) -> Result<ParseOutcome> {
        let id = self
            .index
            .get(rule)
            .copied()
            .ok_or_else(|| GrammarError::unknown_rule(rule))?;

        let execution = Execution {
            rules: &self.rules,
            input,
            max_depth: self.config.max_depth,
        };
        let mut cursor = Cursor::new();
        let result = execution.execute(&self.rules[id.0].node, &mut cursor)?;

        debug!(
            rule,
            success = cursor.success,
            position = cursor.position,
            input_len = input.len(),
            "run finished"
        );
        Ok(ParseOutcome {
            success: cursor.success,
            position: cursor.position,
            result,
        })
    }

    /// Like [`run`](Self::run), then coerces the result tree into `T`.
    ///
    /// Coercion is lenient: mismatched scalars become zero values. Record types
    /// should use `#[serde(default)]` so absent fields do not fail.
    pub fn run_typed<T: DeserializeOwned>(&self, rule: &str, input: &str) -> Result<TypedOutcome<T>> {
        let outcome = self.run(rule, input)?;
        Ok(TypedOutcome {
            success: outcome.success,
            position: outcome.position,
            result: coerce::from_value(&outcome.result)?,
        })
    }
}
