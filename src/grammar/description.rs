//! Node descriptions: the data a grammar is written in.
//!
//! A description is inert. It only becomes executable once the whole rule set is
//! handed to [`Parser::compile`](crate::Parser::compile).

use crate::value::Value;

/// One grammar construct, before compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeDescription {
    /// A regular expression matched at the cursor.
    Pattern(String),
    /// A reference to a named rule, possibly aliased or collapsing.
    Rule(RuleRef),
    /// `contains`: children matched in order.
    Sequence(Sequence),
    /// `first`: ordered alternatives.
    Choice(Choice),
    /// `repeats`: a child matched between `min` and `max` times.
    Repeat(Repeat),
}

/// How an alternation wraps its winning branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestingMode {
    /// The winning branch's value is returned as-is.
    #[default]
    None,
    /// A one-entry map `{branch key: value}`.
    MatchOnly,
    /// A map with an entry for every branch, null for those that did not match.
    FullObject,
}

impl NestingMode {
    /// Reads a `nest` keyword. Unrecognized keywords mean no nesting.
    ///
    /// ```rust
    /// use parsegraph::NestingMode;
    /// assert_eq!(NestingMode::from_keyword("match"), NestingMode::MatchOnly);
    /// assert_eq!(NestingMode::from_keyword("FullObject"), NestingMode::FullObject);
    /// assert_eq!(NestingMode::from_keyword("sideways"), NestingMode::None);
    /// ```
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "match" | "matchonly" => NestingMode::MatchOnly,
            "full" | "object" | "fullobject" => NestingMode::FullObject,
            _ => NestingMode::None,
        }
    }
}

/// A bare `identifier[:alias][::]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    /// Rule being referenced.
    pub target: String,
    /// Result key inside the enclosing sequence or alternation.
    pub alias: Option<String>,
    /// Replaces the enclosing sequence's result with this component's result.
    pub collapse: bool,
}

impl RuleRef {
    /// Splits a reference string.
    ///
    /// A bare identifier is its own key, `id:alias` renames the key, `id:` drops
    /// it, and a trailing `::` marks the component as collapsing.
    ///
    /// ```rust
    /// use parsegraph::RuleRef;
    /// let r = RuleRef::parse("propertyList::");
    /// assert_eq!(r.target, "propertyList");
    /// assert_eq!(r.alias, None);
    /// assert!(r.collapse);
    /// assert_eq!(RuleRef::parse("member").alias.as_deref(), Some("member"));
    /// assert_eq!(RuleRef::parse("member:Name").alias.as_deref(), Some("Name"));
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(':');
        let target = parts.next().unwrap_or_default().to_string();
        let alias = match parts.next() {
            None => Some(target.clone()),
            Some("") => None,
            Some(alias) => Some(alias.to_string()),
        };
        RuleRef {
            target,
            alias,
            collapse: text.ends_with("::"),
        }
    }
}

/// `contains`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub contains: Vec<NodeDescription>,
    pub separator: Option<Box<NodeDescription>>,
    pub name: Option<String>,
    /// Present means optional.
    pub default: Option<Value>,
}

/// `first`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Choice {
    pub first: Vec<NodeDescription>,
    pub nest: NestingMode,
    pub name: Option<String>,
    /// Present means optional.
    pub default: Option<Value>,
}

/// `repeats`
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    pub repeats: Box<NodeDescription>,
    pub separator: Option<Box<NodeDescription>>,
    pub min: usize,
    /// `None` is unbounded.
    pub max: Option<usize>,
    pub name: Option<String>,
}

impl Sequence {
    pub fn new<I, D>(contains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<NodeDescription>,
    {
        Sequence {
            contains: contains.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn separator(mut self, separator: impl Into<NodeDescription>) -> Self {
        self.separator = Some(Box::new(separator.into()));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl Choice {
    pub fn new<I, D>(first: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<NodeDescription>,
    {
        Choice {
            first: first.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn nest(mut self, nest: NestingMode) -> Self {
        self.nest = nest;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl Repeat {
    pub fn new(repeats: impl Into<NodeDescription>) -> Self {
        Repeat {
            repeats: Box::new(repeats.into()),
            separator: None,
            min: 0,
            max: None,
            name: None,
        }
    }

    pub fn separator(mut self, separator: impl Into<NodeDescription>) -> Self {
        self.separator = Some(Box::new(separator.into()));
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A terminal matching `regex` at the cursor.
pub fn pattern(regex: impl Into<String>) -> NodeDescription {
    NodeDescription::Pattern(regex.into())
}

/// A reference written as `identifier[:alias][::]`.
pub fn rule(reference: &str) -> NodeDescription {
    NodeDescription::Rule(RuleRef::parse(reference))
}

/// The array shorthand: a sequence without separator.
pub fn seq<I, D>(contains: I) -> NodeDescription
where
    I: IntoIterator<Item = D>,
    D: Into<NodeDescription>,
{
    Sequence::new(contains).into()
}

impl From<&str> for NodeDescription {
    fn from(reference: &str) -> Self {
        rule(reference)
    }
}

impl From<RuleRef> for NodeDescription {
    fn from(r: RuleRef) -> Self {
        NodeDescription::Rule(r)
    }
}

impl From<Sequence> for NodeDescription {
    fn from(s: Sequence) -> Self {
        NodeDescription::Sequence(s)
    }
}

impl From<Choice> for NodeDescription {
    fn from(c: Choice) -> Self {
        NodeDescription::Choice(c)
    }
}

impl From<Repeat> for NodeDescription {
    fn from(r: Repeat) -> Self {
        NodeDescription::Repeat(r)
    }
}
