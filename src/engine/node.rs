//! Compiled node graph.

use regex_automata::meta::Regex;
use regex_automata::util::primitives::PatternID;

use crate::grammar::NestingMode;
use crate::value::Value;

/// Index of a rule in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

/// An executable grammar node.
///
/// `name`, `collapse` and `fallback` describe how the node sits inside its
/// parent; `kind` describes what it matches.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    /// Result key inside a parent sequence or alternation.
    pub name: Option<String>,
    /// On success, replaces the parent sequence's result.
    pub collapse: bool,
    /// Present when the node is optional.
    pub fallback: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Terminal(Terminal),
    Sequence {
        children: Vec<Node>,
        separator: Option<Box<Node>>,
    },
    Choice {
        children: Vec<Node>,
        nesting: NestingMode,
    },
    Repeat {
        child: Box<Node>,
        separator: Option<Box<Node>>,
        min: usize,
        max: Option<usize>,
    },
    Reference(RuleId),
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            name: None,
            collapse: false,
            fallback: None,
        }
    }
}

/// A compiled pattern plus whether it has a capture group to report.
#[derive(Debug, Clone)]
pub(crate) struct Terminal {
    pub regex: Regex,
    pub captures_group: bool,
}

impl Terminal {
    pub fn new(regex: Regex) -> Self {
        // group 0 is the whole match
        let captures_group = regex.group_info().group_len(PatternID::ZERO) > 1;
        Terminal {
            regex,
            captures_group,
        }
    }
}

/// A named top-level rule.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub name: String,
    pub node: Node,
}
