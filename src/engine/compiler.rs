//! Description → node graph compilation.
//!
//! Rule ids are assigned for every name up front, so references can point at
//! rules that are compiled later (or at the rule being compiled) without the
//! graph ever holding a pointer to its own ancestors.

use std::collections::HashMap;

use regex_automata::meta::{BuildError, Regex};
use tracing::trace;

use super::node::{Node, NodeKind, Rule, RuleId, Terminal};
use crate::errors::{ErrorKind, GrammarError, Result};
use crate::grammar::{Definitions, NodeDescription};

pub(crate) struct CompiledRules {
    pub rules: Vec<Rule>,
    pub index: HashMap<String, RuleId>,
}

pub(crate) fn compile_rules(definitions: &Definitions) -> Result<CompiledRules> {
    let index: HashMap<String, RuleId> = definitions
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.to_string(), RuleId(i)))
        .collect();

    let rules = definitions
        .iter()
        .map(|(name, description)| {
            let compiler = RuleCompiler { rule: name, index: &index };
            let node = compiler.compile(description)?;
            trace!(rule = name, kind = node.kind.label(), "compiled rule");
            Ok(Rule {
                name: name.to_string(),
                node,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledRules { rules, index })
}

/// Compiles the descriptions of one rule; `rule` is only used for errors.
struct RuleCompiler<'a> {
    rule: &'a str,
    index: &'a HashMap<String, RuleId>,
}

impl RuleCompiler<'_> {
    fn compile(&self, description: &NodeDescription) -> Result<Node> {
        match description {
            NodeDescription::Pattern(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| self.pattern_error(pattern, e))?;
                Ok(Node::new(NodeKind::Terminal(Terminal::new(regex))))
            }

            NodeDescription::Rule(reference) => {
                if reference.target.is_empty() {
                    return Err(GrammarError::invalid_description(
                        self.rule,
                        "a rule reference needs an identifier before ':'",
                    ));
                }
                let id = self.index.get(&reference.target).copied().ok_or_else(|| {
                    GrammarError::new(ErrorKind::UnresolvedReference {
                        rule: self.rule.into(),
                        target: reference.target.clone(),
                    })
                })?;
                let mut node = Node::new(NodeKind::Reference(id));
                node.name = reference.alias.clone();
                node.collapse = reference.collapse;
                Ok(node)
            }

            NodeDescription::Sequence(sequence) => {
                let mut node = Node::new(NodeKind::Sequence {
                    children: self.compile_all(&sequence.contains)?,
                    separator: self.compile_separator(sequence.separator.as_deref())?,
                });
                node.name = sequence.name.clone();
                node.fallback = sequence.default.clone();
                Ok(node)
            }

            NodeDescription::Choice(choice) => {
                let mut node = Node::new(NodeKind::Choice {
                    children: self.compile_all(&choice.first)?,
                    nesting: choice.nest,
                });
                node.name = choice.name.clone();
                node.fallback = choice.default.clone();
                Ok(node)
            }

            NodeDescription::Repeat(repeat) => {
                let mut node = Node::new(NodeKind::Repeat {
                    child: Box::new(self.compile(&repeat.repeats)?),
                    separator: self.compile_separator(repeat.separator.as_deref())?,
                    min: repeat.min,
                    max: repeat.max,
                });
                node.name = repeat.name.clone();
                Ok(node)
            }
        }
    }

    fn compile_all(&self, descriptions: &[NodeDescription]) -> Result<Vec<Node>> {
        descriptions.iter().map(|d| self.compile(d)).collect()
    }

    fn compile_separator(&self, separator: Option<&NodeDescription>) -> Result<Option<Box<Node>>> {
        separator
            .map(|s| self.compile(s).map(Box::new))
            .transpose()
    }

    fn pattern_error(&self, pattern: &str, err: BuildError) -> GrammarError {
        let located = match err.syntax_error() {
            Some(regex_syntax::Error::Parse(e)) => {
                Some((e.kind().to_string(), e.span().start.offset..e.span().end.offset))
            }
            Some(regex_syntax::Error::Translate(e)) => {
                Some((e.kind().to_string(), e.span().start.offset..e.span().end.offset))
            }
            _ => None,
        };
        let message = located
            .as_ref()
            .map(|(m, _)| m.clone())
            .unwrap_or_else(|| err.to_string());
        let error = GrammarError::new(ErrorKind::InvalidPattern {
            rule: self.rule.into(),
            pattern: pattern.into(),
            message,
        });
        match located {
            Some((_, span)) => {
                error.with_source(format!("pattern in rule '{}'", self.rule), pattern, span)
            }
            None => error,
        }
    }
}

impl NodeKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            NodeKind::Terminal(_) => "terminal",
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Choice { .. } => "choice",
            NodeKind::Repeat { .. } => "repeat",
            NodeKind::Reference(_) => "reference",
        }
    }
}
