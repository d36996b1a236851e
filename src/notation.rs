//! Textual grammar notation.
//!
//! A JSON superset: keys may be bare identifiers, `/.../` is a regex literal,
//! values may be bare identifiers, and trailing commas are accepted.
//!
//! ```text
//! {
//!   definitions: {
//!     member: /[A-Za-z_][A-Za-z0-9_]+/,
//!     call: ['member:Target', /\(/, 'member:Argument', /\)/],
//!     calls: { repeats: call, separator: /\s*;\s*/, min: 1 },
//!   }
//! }
//! ```
//!
//! The notation is itself parsed by this engine: [`NOTATION`] is a grammar for
//! the notation, written with the programmatic API and compiled on first use.
//! Its result tree is then turned into [`Definitions`].

use once_cell::sync::Lazy;
use tracing::debug;

use crate::engine::Parser;
use crate::errors::{ErrorKind, GrammarError, Result};
use crate::grammar::{
    pattern, seq, Choice, Definitions, NestingMode, NodeDescription, Repeat, RuleRef, Sequence,
};
use crate::value::Value;

/// The compiled notation grammar. Its entry rule is `document`.
pub static NOTATION: Lazy<Parser> = Lazy::new(|| {
    Parser::compile(&notation_definitions()).expect("notation grammar compiles")
});

/// The notation grammar, as descriptions.
pub fn notation_definitions() -> Definitions {
    let list_separator = || pattern(r"\s*,\s*");
    Definitions::new()
        .define("identifier", pattern(r"[A-Za-z_][A-Za-z0-9_]*"))
        .define("doubleQuoteName", pattern(r#""((?:[^"\\]|\\.)*)""#))
        .define("singleQuoteName", pattern(r"'((?:[^'\\]|\\.)*)'"))
        .define("regexValue", pattern(r"/((?:[^/\\]|\\.)*)/"))
        .define("numberValue", pattern(r"[-+]?(?:\d+\.?\d*|\d*\.?\d+)"))
        .define("boolValue", pattern(r"(?:true|false)\b"))
        .define("nullValue", pattern(r"(null|undefined)\b"))
        .define("stringValue", Choice::new(["doubleQuoteName", "singleQuoteName"]))
        .define("propertyName", Choice::new(["identifier", "stringValue"]))
        .define(
            "property",
            seq([
                "propertyName:Name".into(),
                pattern(r"\s*:\s*"),
                "propertyValue:Value".into(),
            ]),
        )
        .define("propertyList", Repeat::new("property").separator(list_separator()))
        .define("valueList", Repeat::new("propertyValue").separator(list_separator()))
        .define(
            "object",
            seq([pattern(r"\{\s*"), "propertyList::".into(), pattern(r"\s*\}")]),
        )
        .define(
            "array",
            seq([pattern(r"\[\s*"), "valueList::".into(), pattern(r"\s*\]")]),
        )
        .define(
            "propertyValue",
            Choice::new([
                "stringValue:String",
                "regexValue:Regex",
                "object:Object",
                "array:Array",
                "numberValue:Number",
                "boolValue:Boolean",
                "nullValue:Null",
                "identifier:Identifier",
            ])
            .nest(NestingMode::MatchOnly),
        )
        .define(
            "document",
            seq([pattern(r"\s*"), "object::".into(), pattern(r"\s*")]),
        )
}

/// Parses notation text into grammar definitions.
pub fn parse_notation(text: &str) -> Result<Definitions> {
    parse_notation_named("grammar", text)
}

/// Same as [`parse_notation`]; `name` labels the source in diagnostics.
pub fn parse_notation_named(name: &str, text: &str) -> Result<Definitions> {
    let outcome = NOTATION.run("document", text)?;
    if !outcome.is_complete(text) {
        let at = outcome.position.min(text.len());
        let reason = if outcome.success {
            "unexpected text after the grammar object"
        } else {
            "expected a `{ definitions: { ... } }` object"
        };
        return Err(GrammarError::invalid_notation(reason).with_source(name, text, at..at));
    }

    let root = properties(&outcome.result, "document")?;
    let (_, definitions) = root
        .iter()
        .find(|(key, _)| key == "definitions")
        .ok_or_else(|| GrammarError::invalid_notation("missing `definitions`"))?;
    let rules = match literal(definitions) {
        Some(("Object", inner)) => properties(inner, "definitions")?,
        _ => return Err(GrammarError::invalid_notation("`definitions` must be an object")),
    };

    let mut defs = Definitions::new();
    for (rule, value) in rules {
        let description = describe(&rule, value)?;
        if defs.insert(rule.clone(), description).is_some() {
            return Err(GrammarError::new(ErrorKind::DuplicateRule { rule }));
        }
    }
    debug!(rules = defs.len(), source = name, "parsed grammar notation");
    Ok(defs)
}

// ============================================================================
// RESULT TREE → DESCRIPTIONS
// ============================================================================

/// `{Kind: inner}` as produced by the `propertyValue` alternation.
fn literal(value: &Value) -> Option<(&str, &Value)> {
    let map = value.as_map()?;
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

/// The `[{Name, Value}]` list produced by `propertyList`.
fn properties<'a>(value: &'a Value, owner: &str) -> Result<Vec<(String, &'a Value)>> {
    let items = value
        .as_list()
        .ok_or_else(|| GrammarError::invalid_notation(format!("`{owner}` is not an object")))?;
    items
        .iter()
        .map(|item| {
            let key = item.get("Name").and_then(Value::as_str);
            let value = item.get("Value");
            match (key, value) {
                (Some(key), Some(value)) => Ok((unescape(key), value)),
                _ => Err(GrammarError::invalid_notation(format!(
                    "malformed property in `{owner}`"
                ))),
            }
        })
        .collect()
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

fn describe(rule: &str, value: &Value) -> Result<NodeDescription> {
    match literal(value) {
        Some(("String", inner)) => Ok(RuleRef::parse(&unescape(text(inner))).into()),
        Some(("Identifier", inner)) => Ok(RuleRef::parse(text(inner)).into()),
        Some(("Regex", inner)) => Ok(pattern(text(inner).replace("\\/", "/"))),
        Some(("Array", inner)) => {
            let contains = inner
                .as_list()
                .unwrap_or_default()
                .iter()
                .map(|item| describe(rule, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Sequence {
                contains,
                ..Default::default()
            }
            .into())
        }
        Some(("Object", inner)) => describe_object(rule, properties(inner, rule)?),
        Some((kind, inner)) => Err(GrammarError::invalid_description(
            rule,
            format!("{} `{}` is not a grammar construct", kind.to_lowercase(), text(inner)),
        )),
        None => Err(GrammarError::invalid_description(rule, "unrecognized value")),
    }
}

fn describe_object(rule: &str, props: Vec<(String, &Value)>) -> Result<NodeDescription> {
    let mut contains = None;
    let mut first = None;
    let mut repeats = None;
    let mut separator = None;
    let mut min = 0;
    let mut max = None;
    let mut nest = NestingMode::None;
    let mut name = None;
    let mut default = None;

    for (key, value) in props {
        match key.as_str() {
            "contains" => contains = Some(describe_list(rule, &key, value)?),
            "first" => first = Some(describe_list(rule, &key, value)?),
            "repeats" => repeats = Some(describe(rule, value)?),
            "separator" => separator = Some(Box::new(describe(rule, value)?)),
            "min" => min = count(rule, &key, value)?,
            "max" => max = Some(count(rule, &key, value)?),
            "nest" => nest = NestingMode::from_keyword(&word(rule, &key, value)?),
            "name" => name = Some(word(rule, &key, value)?),
            "default" => default = default_value(value),
            other => {
                return Err(GrammarError::invalid_description(
                    rule,
                    format!("unknown key `{other}`"),
                ))
            }
        }
    }

    match (contains, first, repeats) {
        (Some(contains), None, None) => Ok(Sequence {
            contains,
            separator,
            name,
            default,
        }
        .into()),
        (None, Some(first), None) => Ok(Choice {
            first,
            nest,
            name,
            default,
        }
        .into()),
        (None, None, Some(repeats)) => Ok(Repeat {
            repeats: Box::new(repeats),
            separator,
            min,
            max,
            name,
        }
        .into()),
        (None, None, None) => Err(GrammarError::invalid_description(
            rule,
            "object needs one of `contains`, `first`, or `repeats`",
        )),
        _ => Err(GrammarError::invalid_description(
            rule,
            "use only one of `contains`, `first`, or `repeats`",
        )),
    }
}

fn describe_list(rule: &str, key: &str, value: &Value) -> Result<Vec<NodeDescription>> {
    match literal(value) {
        Some(("Array", inner)) => inner
            .as_list()
            .unwrap_or_default()
            .iter()
            .map(|item| describe(rule, item))
            .collect(),
        _ => Err(GrammarError::invalid_description(
            rule,
            format!("`{key}` must be an array"),
        )),
    }
}

fn count(rule: &str, key: &str, value: &Value) -> Result<usize> {
    let number = match literal(value) {
        Some(("Number", inner)) => text(inner).parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n >= 0.0 && n.is_finite() => Ok(n as usize),
        _ => Err(GrammarError::invalid_description(
            rule,
            format!("`{key}` must be a non-negative number"),
        )),
    }
}

fn word(rule: &str, key: &str, value: &Value) -> Result<String> {
    match literal(value) {
        Some(("String", inner)) => Ok(unescape(text(inner))),
        Some(("Identifier", inner)) => Ok(text(inner).to_string()),
        _ => Err(GrammarError::invalid_description(
            rule,
            format!("`{key}` must be a string"),
        )),
    }
}

/// `undefined` means no default at all.
fn default_value(value: &Value) -> Option<Value> {
    match literal(value) {
        Some(("Null", inner)) if text(inner) == "undefined" => None,
        _ => Some(plain_value(value)),
    }
}

fn plain_value(value: &Value) -> Value {
    match literal(value) {
        Some(("String", inner)) => Value::String(unescape(text(inner))),
        Some(("Null", _)) => Value::Null,
        Some(("Array", inner)) => Value::List(
            inner
                .as_list()
                .unwrap_or_default()
                .iter()
                .map(plain_value)
                .collect(),
        ),
        Some(("Object", inner)) => Value::Map(
            inner
                .as_list()
                .unwrap_or_default()
                .iter()
                .filter_map(|p| {
                    let key = p.get("Name")?.as_str()?;
                    Some((unescape(key), plain_value(p.get("Value")?)))
                })
                .collect(),
        ),
        Some((_, inner)) => inner.clone(),
        None => Value::Null,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(e @ ('\\' | '"' | '\'' | '/')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::rule;

    #[test]
    fn test_notation_grammar_compiles() {
        assert!(NOTATION.contains_rule("document"));
    }

    #[test]
    fn test_scalar_rules() {
        let defs = parse_notation(
            r#"{ definitions: { word: /[a-z]+/, "alias": 'word:Text', bare: word } }"#,
        )
        .unwrap();
        assert_eq!(defs.get("word"), Some(&pattern("[a-z]+")));
        assert_eq!(defs.get("alias"), Some(&rule("word:Text")));
        assert_eq!(defs.get("bare"), Some(&rule("word")));
    }

    #[test]
    fn test_escaped_slash_in_regex_literal() {
        let defs = parse_notation(r"{definitions:{path:/a\/b/}}").unwrap();
        assert_eq!(defs.get("path"), Some(&pattern("a/b")));
    }

    #[test]
    fn test_object_shapes() {
        let defs = parse_notation(
            r#"{
                definitions: {
                    item: /\w+/,
                    list: { repeats: item, separator: /,/, min: 1, max: 3 },
                    pick: { first: [item, /-/], nest: 'full', name: 'Pick', default: null },
                    pair: { contains: ['item:Left', 'item:Right'], separator: /\s+/, },
                }
            }"#,
        )
        .unwrap();

        match defs.get("list") {
            Some(NodeDescription::Repeat(r)) => {
                assert_eq!((r.min, r.max), (1, Some(3)));
                assert_eq!(r.separator.as_deref(), Some(&pattern(",")));
            }
            other => panic!("expected a repeat, got {other:?}"),
        }
        match defs.get("pick") {
            Some(NodeDescription::Choice(c)) => {
                assert_eq!(c.nest, NestingMode::FullObject);
                assert_eq!(c.name.as_deref(), Some("Pick"));
                assert_eq!(c.default, Some(Value::Null));
                assert_eq!(c.first.len(), 2);
            }
            other => panic!("expected a choice, got {other:?}"),
        }
        match defs.get("pair") {
            Some(NodeDescription::Sequence(s)) => {
                assert_eq!(s.contains.len(), 2);
                assert_eq!(s.default, None);
            }
            other => panic!("expected a sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_default_is_absent() {
        let defs =
            parse_notation("{definitions:{a:{contains:[/a/], default: undefined}}}").unwrap();
        match defs.get("a") {
            Some(NodeDescription::Sequence(s)) => assert_eq!(s.default, None),
            other => panic!("expected a sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_text_is_located() {
        let text = "{definitions:{a:/a/}} junk";
        let err = parse_notation(text).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidNotation { .. }));
        let span = err.source_info.unwrap().primary_span;
        assert_eq!(span.offset(), 22);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = parse_notation("{definitions:{a:/a/, a:/b/}}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateRule { rule: "a".into() });
    }

    #[test]
    fn test_number_is_not_a_description() {
        let err = parse_notation("{definitions:{a: 42}}").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidDescription { ref rule, .. } if rule == "a"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\\c\n"#), "a\"b\\c\n");
        assert_eq!(unescape(r"\d"), r"\d");
    }
}
