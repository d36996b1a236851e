//! JSON and YAML grammar files.
//!
//! Both formats use the same document shape as the textual notation:
//!
//! ```yaml
//! definitions:
//!   word: /[a-z]+/
//!   words: { repeats: word, separator: "/\\s+/", min: 1 }
//! ```
//!
//! A string is a rule reference unless it is wrapped in slashes, in which case it
//! is a pattern. `{ pattern: "..." }` spells a pattern explicitly.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::debug;

use super::description::{Choice, NestingMode, NodeDescription, Repeat, RuleRef, Sequence};
use super::Definitions;
use crate::errors::{ErrorKind, GrammarError, Result};
use crate::value::Value;

/// Top-level shape of a grammar file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarDocument {
    pub definitions: Definitions,
}

/// Grammar source formats understood by [`load_grammar_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFormat {
    Json,
    Yaml,
    Notation,
}

impl GrammarFormat {
    /// Picks the format from a file extension; unknown extensions are notation.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => GrammarFormat::Json,
            Some("yaml") | Some("yml") => GrammarFormat::Yaml,
            _ => GrammarFormat::Notation,
        }
    }

    /// Decodes grammar text in this format.
    pub fn parse(self, name: &str, text: &str) -> Result<Definitions> {
        match self {
            GrammarFormat::Json => serde_json::from_str::<GrammarDocument>(text)
                .map(|doc| doc.definitions)
                .map_err(|e| {
                    let offset = line_column_offset(text, e.line(), e.column());
                    format_error("JSON", e.to_string()).with_source(name, text, offset..offset)
                }),
            GrammarFormat::Yaml => serde_yaml::from_str::<GrammarDocument>(text)
                .map(|doc| doc.definitions)
                .map_err(|e| {
                    let offset = e.location().map(|l| l.index()).unwrap_or(0);
                    format_error("YAML", e.to_string()).with_source(name, text, offset..offset)
                }),
            GrammarFormat::Notation => crate::notation::parse_notation_named(name, text),
        }
    }
}

impl fmt::Display for GrammarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GrammarFormat::Json => "JSON",
            GrammarFormat::Yaml => "YAML",
            GrammarFormat::Notation => "notation",
        })
    }
}

/// Reads a grammar file, choosing the decoder by extension.
pub fn load_grammar_file(path: impl AsRef<Path>) -> Result<Definitions> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        GrammarError::new(ErrorKind::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    })?;
    let format = GrammarFormat::from_path(path);
    debug!(path = %path.display(), %format, "loading grammar file");
    format.parse(&path.display().to_string(), &text)
}

fn format_error(format: &str, message: String) -> GrammarError {
    GrammarError::new(ErrorKind::Format {
        format: format.into(),
        message,
    })
}

fn line_column_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

// ============================================================================
// SERDE
// ============================================================================

impl<'de> Deserialize<'de> for Definitions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rules = std::collections::BTreeMap::<String, NodeDescription>::deserialize(deserializer)?;
        Ok(Definitions { rules })
    }
}

impl<'de> Deserialize<'de> for NodeDescription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RawDescription::deserialize(deserializer)?
            .try_into()
            .map_err(de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescription {
    Text(String),
    Series(Vec<NodeDescription>),
    Object(Box<RawObject>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawObject {
    pattern: Option<String>,
    contains: Option<Vec<NodeDescription>>,
    first: Option<Vec<NodeDescription>>,
    repeats: Option<NodeDescription>,
    separator: Option<NodeDescription>,
    min: Option<usize>,
    max: Option<usize>,
    nest: Option<String>,
    name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
}

/// Distinguishes `default: null` (optional, null fallback) from no `default`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawDescription> for NodeDescription {
    type Error = String;

    fn try_from(raw: RawDescription) -> std::result::Result<Self, String> {
        match raw {
            RawDescription::Text(text) => Ok(text_description(&text)),
            RawDescription::Series(items) => Ok(Sequence {
                contains: items,
                ..Default::default()
            }
            .into()),
            RawDescription::Object(object) => object_description(*object),
        }
    }
}

fn text_description(text: &str) -> NodeDescription {
    match text.strip_prefix('/').and_then(|t| t.strip_suffix('/')) {
        // same escape as regex literals in the notation
        Some(regex) => NodeDescription::Pattern(regex.replace("\\/", "/")),
        None => NodeDescription::Rule(RuleRef::parse(text)),
    }
}

fn object_description(raw: RawObject) -> std::result::Result<NodeDescription, String> {
    let separator = raw.separator.map(Box::new);
    let shapes = [
        raw.pattern.is_some(),
        raw.contains.is_some(),
        raw.first.is_some(),
        raw.repeats.is_some(),
    ];
    if shapes.iter().filter(|s| **s).count() > 1 {
        return Err("use only one of `pattern`, `contains`, `first`, or `repeats`".into());
    }

    if let Some(pattern) = raw.pattern {
        return Ok(NodeDescription::Pattern(pattern));
    }
    if let Some(contains) = raw.contains {
        return Ok(Sequence {
            contains,
            separator,
            name: raw.name,
            default: raw.default,
        }
        .into());
    }
    if let Some(first) = raw.first {
        return Ok(Choice {
            first,
            nest: raw
                .nest
                .as_deref()
                .map(NestingMode::from_keyword)
                .unwrap_or_default(),
            name: raw.name,
            default: raw.default,
        }
        .into());
    }
    if let Some(repeats) = raw.repeats {
        return Ok(Repeat {
            repeats: Box::new(repeats),
            separator,
            min: raw.min.unwrap_or(0),
            max: raw.max,
            name: raw.name,
        }
        .into());
    }
    Err("a description object needs one of `pattern`, `contains`, `first`, or `repeats`".into())
}
