//! Declarative persistence of child-control layout properties.
//!
//! Host controls expose themselves through [`PropertyNode`]; a [`RuleTable`]
//! names which properties of which control types are persisted, and
//! [`PropertyWalker`] reads or writes them against a [`Store`](crate::storage::Store).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

mod convert;
mod rules;
mod walker;

pub use convert::{ConversionError, ConverterRegistry, DefaultConverter, StoredValue, ValueConverter};
pub use rules::{
    ApplicationKind, PropertyPath, PropertyRule, RuleParseError, RuleTable, TypeCast,
};
pub use walker::{PropertyEntry, PropertyWalker};

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("property path {path} does not resolve on {type_tag}: no {segment:?}")]
    PathResolution {
        type_tag: String,
        path: String,
        segment: String,
    },
    #[error("{type_tag} rejected value for {property:?}: {reason}")]
    Rejected {
        type_tag: String,
        property: String,
        reason: String,
    },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("stored value {key:?} = {value:?} is malformed: {reason}")]
    MalformedValue {
        key: String,
        value: String,
        reason: String,
    },
}

pub type PropertyResult<T> = std::result::Result<T, PropertyError>;

/// Why a host control refused a property write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    UnknownProperty,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Text,
}

impl ValueKind {
    pub const NUMERIC: [ValueKind; 6] = [
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::U32,
        ValueKind::U64,
        ValueKind::F32,
        ValueKind::F64,
    ];

    pub const fn type_name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Text => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ValueKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::I32,
            Self::I64,
            Self::U32,
            Self::U64,
            Self::F32,
            Self::F64,
            Self::Bool,
            Self::Text,
        ]
        .into_iter()
        .find(|kind| kind.type_name() == s)
        .ok_or_else(|| ConversionError::UnknownKind(s.to_string()))
    }
}

/// A scalar property value as exposed by a host control.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
        }
    }
}

/// Identity labels a control or collection element may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementIdentity {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
}

impl ElementIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The label used to key this element in the store: explicit uid, then
    /// display name, then a `Name=<label>` tag. `None` if none is set.
    ///
    /// Elements without a stable uid are keyed by whatever label they carry
    /// (or by position), so reordering unlabelled elements between runs
    /// reassigns their stored values.
    pub fn reference_name(&self) -> Option<String> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        non_empty(&self.uid)
            .or_else(|| non_empty(&self.name))
            .or_else(|| {
                self.tag
                    .as_deref()
                    .and_then(|tag| tag.strip_prefix("Name="))
                    .filter(|name| !name.is_empty())
            })
            .map(str::to_string)
    }

    pub fn reference_name_or_index(&self, index: usize) -> String {
        self.reference_name().unwrap_or_else(|| index.to_string())
    }
}

/// Typed adapter a host implements for each persisted control type.
///
/// Every lookup is by property name and returns `None` when the control has
/// no such property, which the walker reports as a path resolution failure.
pub trait PropertyNode {
    /// Type tag matched against [`PropertyRule::type_tag`].
    fn type_tag(&self) -> &str;

    fn identity(&self) -> ElementIdentity {
        ElementIdentity::default()
    }

    fn value(&self, _property: &str) -> Option<PropertyValue> {
        None
    }

    fn set_value(&mut self, _property: &str, _value: PropertyValue) -> Result<(), AccessError> {
        Err(AccessError::UnknownProperty)
    }

    /// The element's own value, for collections of plain scalars.
    fn self_value(&self) -> Option<PropertyValue> {
        None
    }

    fn set_self_value(&mut self, _value: PropertyValue) -> Result<(), AccessError> {
        Err(AccessError::UnknownProperty)
    }

    fn node(&self, _property: &str) -> Option<&dyn PropertyNode> {
        None
    }

    fn node_mut(&mut self, _property: &str) -> Option<&mut dyn PropertyNode> {
        None
    }

    fn items(&self, _property: &str) -> Option<Vec<&dyn PropertyNode>> {
        None
    }

    fn items_mut(&mut self, _property: &str) -> Option<Vec<&mut dyn PropertyNode>> {
        None
    }

    /// Direct child controls in the control tree.
    fn children(&self) -> Vec<&dyn PropertyNode> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn PropertyNode> {
        Vec::new()
    }
}
