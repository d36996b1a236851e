//! Grammar descriptions and where they come from.
//!
//! - [`description`]: the node description data model and builder helpers.
//! - [`document`]: serde decoding of JSON and YAML grammar files.
//!
//! The textual notation lives in [`crate::notation`]; it produces the same
//! [`Definitions`] as everything here.

use std::collections::BTreeMap;

pub mod description;
pub mod document;

pub use description::{
    pattern, rule, seq, Choice, NestingMode, NodeDescription, Repeat, RuleRef, Sequence,
};
pub use document::{load_grammar_file, GrammarDocument, GrammarFormat};

/// A grammar: rule names mapped to their descriptions.
///
/// # Example
/// ```rust
/// use parsegraph::{pattern, seq, Definitions};
/// let defs = Definitions::new()
///     .define("word", pattern("[a-z]+"))
///     .define("pair", seq(["word:left", "word:right"]));
/// assert_eq!(defs.len(), 2);
/// assert!(defs.get("pair").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    rules: BTreeMap<String, NodeDescription>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, replacing any previous rule of the same name.
    pub fn define(mut self, name: impl Into<String>, description: impl Into<NodeDescription>) -> Self {
        self.insert(name, description);
        self
    }

    /// Returns the previous description if the name was already taken.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        description: impl Into<NodeDescription>,
    ) -> Option<NodeDescription> {
        self.rules.insert(name.into(), description.into())
    }

    pub fn get(&self, name: &str) -> Option<&NodeDescription> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeDescription)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, NodeDescription)> for Definitions {
    fn from_iter<I: IntoIterator<Item = (K, NodeDescription)>>(iter: I) -> Self {
        Definitions {
            rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Definitions {
    type Item = (&'a String, &'a NodeDescription);
    type IntoIter = std::collections::btree_map::Iter<'a, String, NodeDescription>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
