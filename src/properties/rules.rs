use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const COLLECTION_MARKER: &str = "[]";
const MAX_PATH_SEGMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("rule line {0:?} is not `<type>|<path>`")]
    MissingSeparator(String),
    #[error("rule line {0:?} has an empty type tag")]
    EmptyTypeTag(String),
    #[error("property path {0:?} has an empty segment")]
    EmptySegment(String),
    #[error("property path {path:?} has {count} segments; at most 3 are supported")]
    TooDeep { path: String, count: usize },
}

/// Which built-in rule preset a process binds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApplicationKind {
    /// Field-style control trees: split containers, list and grid views.
    #[default]
    Forms,
    /// Markup-declared trees: grid row/column definitions, list views.
    Xaml,
}

impl ApplicationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forms => "forms",
            Self::Xaml => "xaml",
        }
    }
}

/// A parsed rule path: `A`, `A.B`, `A.B.C`, optionally prefixed by `[]`
/// when `A` is a collection whose elements receive the rest of the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    collection: bool,
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path without the collection marker, e.g. `Columns.Width`.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl FromStr for PropertyPath {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (collection, rest) = match trimmed.strip_prefix(COLLECTION_MARKER) {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let segments = rest
            .split('.')
            .map(|segment| segment.trim().to_string())
            .collect::<Vec<_>>();
        if segments.iter().any(String::is_empty) {
            return Err(RuleParseError::EmptySegment(s.to_string()));
        }
        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(RuleParseError::TooDeep {
                path: s.to_string(),
                count: segments.len(),
            });
        }
        Ok(Self {
            collection,
            segments,
        })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collection {
            f.write_str(COLLECTION_MARKER)?;
        }
        f.write_str(&self.dotted())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRule {
    pub type_tag: String,
    pub path: PropertyPath,
}

impl PropertyRule {
    pub fn new(type_tag: impl Into<String>, path: PropertyPath) -> Self {
        Self {
            type_tag: type_tag.into(),
            path,
        }
    }
}

impl FromStr for PropertyRule {
    type Err = RuleParseError;

    /// Parses a companion rule line of the form `<type tag>|<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (type_tag, path) = s
            .split_once('|')
            .ok_or_else(|| RuleParseError::MissingSeparator(s.to_string()))?;
        let type_tag = type_tag.trim();
        if type_tag.is_empty() {
            return Err(RuleParseError::EmptyTypeTag(s.to_string()));
        }
        Ok(Self::new(type_tag, path.parse()?))
    }
}

impl fmt::Display for PropertyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.type_tag, self.path)
    }
}

/// Resolves a control through one of its properties before path lookup,
/// e.g. a list view is walked through its `View` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCast {
    pub type_tag: String,
    pub view_property: String,
    /// The rule path this cast applies to; `None` applies to every path.
    pub on_path: Option<PropertyPath>,
}

impl TypeCast {
    pub fn new(
        type_tag: impl Into<String>,
        view_property: impl Into<String>,
        on_path: Option<PropertyPath>,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            view_property: view_property.into(),
            on_path,
        }
    }
}

/// Which properties of which control types are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<PropertyRule>,
    casts: Vec<TypeCast>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(kind: ApplicationKind) -> Self {
        let lines: &[&str] = match kind {
            ApplicationKind::Forms => &[
                "SplitContainer|SplitterDistance",
                "Splitter|SplitPosition",
                "ListView|[]Columns.Width",
                "DataGridView|[]Columns.Width",
            ],
            ApplicationKind::Xaml => &[
                "Grid|[]ColumnDefinitions.Width",
                "Grid|[]RowDefinitions.Height",
                "ListView|[]Columns.Width",
            ],
        };

        let mut table = Self::new();
        for line in lines {
            if let Err(err) = table.add_rule_line(line) {
                tracing::warn!(%err, line, "skipping invalid preset rule");
            }
        }
        if kind == ApplicationKind::Xaml {
            if let Ok(path) = "[]Columns.Width".parse() {
                table.add_cast(TypeCast::new("ListView", "View", Some(path)));
            }
        }
        table
    }

    /// Adds `rule` unless an identical rule exists; returns whether it was added.
    pub fn add_rule(&mut self, rule: PropertyRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn add_rule_line(&mut self, line: &str) -> Result<bool, RuleParseError> {
        Ok(self.add_rule(line.parse()?))
    }

    pub fn add_cast(&mut self, cast: TypeCast) {
        if !self.casts.contains(&cast) {
            self.casts.push(cast);
        }
    }

    pub fn rules(&self) -> &[PropertyRule] {
        &self.rules
    }

    pub fn rules_for<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = &'a PropertyRule> + 'a {
        self.rules.iter().filter(move |rule| rule.type_tag == type_tag)
    }

    pub fn has_rules_for(&self, type_tag: &str) -> bool {
        self.rules_for(type_tag).next().is_some()
    }

    /// A cast bound to exactly `path` wins over a cast for every path.
    pub fn cast_for(&self, type_tag: &str, path: &PropertyPath) -> Option<&TypeCast> {
        let mut for_type = self.casts.iter().filter(|cast| cast.type_tag == type_tag);
        for_type
            .clone()
            .find(|cast| cast.on_path.as_ref() == Some(path))
            .or_else(|| for_type.find(|cast| cast.on_path.is_none()))
    }
}
