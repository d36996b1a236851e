//! Node execution.
//!
//! One [`Cursor`] is threaded by `&mut` through a whole run. Nodes save the
//! position they started at and restore it themselves on the failure paths they
//! own; nothing is snapshotted or copied.

use im::OrdMap;
use regex_automata::{Anchored, Input};

use super::node::{Node, NodeKind, Rule, RuleId, Terminal};
use crate::errors::{ErrorKind, GrammarError, Result};
use crate::grammar::NestingMode;
use crate::value::Value;

/// Mutable state of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cursor {
    /// Byte offset into the input.
    pub position: usize,
    pub success: bool,
    depth: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor {
            position: 0,
            success: true,
            depth: 0,
        }
    }
}

/// Everything a run reads but never changes.
pub(crate) struct Execution<'a> {
    pub rules: &'a [Rule],
    pub input: &'a str,
    pub max_depth: usize,
}

impl Execution<'_> {
    /// Runs `node` at the cursor.
    ///
    /// `Ok` carries the node's result whether it matched or not; the verdict is
    /// in `cursor.success`. `Err` only for aborted runs.
    pub fn execute(&self, node: &Node, cursor: &mut Cursor) -> Result<Value> {
        cursor.success = true;

        match &node.kind {
            NodeKind::Terminal(terminal) => Ok(self.execute_terminal(terminal, cursor)),
            NodeKind::Sequence {
                children,
                separator,
            } => self.execute_sequence(node, children, separator.as_deref(), cursor),
            NodeKind::Choice { children, nesting } => {
                self.execute_choice(node, children, *nesting, cursor)
            }
            NodeKind::Repeat {
                child,
                separator,
                min,
                max,
            } => self.execute_repeat(child, separator.as_deref(), *min, *max, cursor),
            NodeKind::Reference(id) => self.execute_reference(*id, cursor),
        }
    }

    /// Only rule references count towards `max_depth`.
    fn execute_reference(&self, id: RuleId, cursor: &mut Cursor) -> Result<Value> {
        cursor.depth += 1;
        if cursor.depth > self.max_depth {
            return Err(GrammarError::new(ErrorKind::RecursionLimit {
                limit: self.max_depth,
            }));
        }
        let result = self.execute(&self.rules[id.0].node, cursor);
        cursor.depth -= 1;
        result
    }

    fn execute_terminal(&self, terminal: &Terminal, cursor: &mut Cursor) -> Value {
        let input = Input::new(self.input)
            .range(cursor.position..)
            .anchored(Anchored::Yes);
        let mut caps = terminal.regex.create_captures();
        terminal.regex.search_captures(&input, &mut caps);

        let Some(found) = caps.get_match() else {
            cursor.success = false;
            return Value::Null;
        };
        cursor.success = true;
        cursor.position = found.end();

        let span = if terminal.captures_group {
            caps.get_group(1)
        } else {
            Some(found.span())
        };
        Value::String(
            span.map(|s| self.input[s.start..s.end].to_string())
                .unwrap_or_default(),
        )
    }

    fn execute_sequence(
        &self,
        node: &Node,
        children: &[Node],
        separator: Option<&Node>,
        cursor: &mut Cursor,
    ) -> Result<Value> {
        let start = cursor.position;
        let mut fields = OrdMap::new();
        let mut collapsed = None;

        for (i, child) in children.iter().enumerate() {
            let item = self.execute(child, cursor)?;
            if cursor.success && child.collapse {
                collapsed = Some(item.clone());
            }
            if let Some(name) = &child.name {
                fields.insert(name.clone(), item);
            }
            if !cursor.success {
                break;
            }
            if i + 1 < children.len() {
                if let Some(separator) = separator {
                    self.execute(separator, cursor)?;
                    if !cursor.success {
                        break;
                    }
                }
            }
        }

        if cursor.success {
            return Ok(collapsed.unwrap_or(Value::Map(fields)));
        }
        if let Some(fallback) = &node.fallback {
            cursor.success = true;
            cursor.position = start;
            return Ok(fallback.clone());
        }
        // partial fields stay visible for diagnostics
        Ok(Value::Map(fields))
    }

    fn execute_choice(
        &self,
        node: &Node,
        children: &[Node],
        nesting: NestingMode,
        cursor: &mut Cursor,
    ) -> Result<Value> {
        let full = nesting == NestingMode::FullObject;
        let start = cursor.position;
        let mut deepest = start;
        let mut deepest_result = Value::Null;
        let mut matched = false;
        let mut result = Value::Null;
        let mut fields = OrdMap::new();

        for (i, child) in children.iter().enumerate() {
            if matched && !full {
                break;
            }
            let key = child
                .name
                .clone()
                .unwrap_or_else(|| format!("property{}", i + 1));

            if matched {
                // shape-complete record: later branches are listed but not tried
                fields.insert(key, Value::Null);
                continue;
            }

            cursor.position = start;
            let item = self.execute(child, cursor)?;
            if cursor.success {
                matched = true;
                match nesting {
                    NestingMode::None => result = item,
                    NestingMode::MatchOnly | NestingMode::FullObject => {
                        fields.insert(key, item);
                    }
                }
            } else {
                if cursor.position > deepest {
                    deepest = cursor.position;
                    deepest_result = item;
                }
                cursor.position = start;
                if full {
                    fields.insert(key, Value::Null);
                }
            }
        }

        if nesting != NestingMode::None {
            result = Value::Map(fields);
        }
        if matched {
            cursor.success = true;
            return Ok(result);
        }

        cursor.success = false;
        if let Some(fallback) = &node.fallback {
            cursor.success = true;
            cursor.position = start;
            return Ok(fallback.clone());
        }
        cursor.position = deepest;
        Ok(deepest_result)
    }

    fn execute_repeat(
        &self,
        child: &Node,
        separator: Option<&Node>,
        min: usize,
        max: Option<usize>,
        cursor: &mut Cursor,
    ) -> Result<Value> {
        let mut items = Vec::new();
        let mut commit = cursor.position;
        let mut last_failure = Value::Null;

        while max.map_or(true, |max| items.len() < max) {
            let before = cursor.position;
            let item = self.execute(child, cursor)?;
            if !cursor.success {
                last_failure = item;
                break;
            }
            items.push(item);
            commit = cursor.position;

            if let Some(separator) = separator {
                self.execute(separator, cursor)?;
                if !cursor.success {
                    break;
                }
                // committed even if no element follows it
                commit = cursor.position;
            }

            if max.is_none() && cursor.position == before && items.len() >= min {
                break;
            }
        }

        cursor.success = items.len() >= min;
        if cursor.success {
            cursor.position = commit;
        } else if !last_failure.is_null() {
            items.push(last_failure);
        }
        Ok(Value::List(items))
    }
}
