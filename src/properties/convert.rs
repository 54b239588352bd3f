use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::{PropertyValue, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert {text:?} to {kind}: {reason}")]
    FromText {
        text: String,
        kind: ValueKind,
        reason: String,
    },
    #[error("cannot convert {kind} value to text: {reason}")]
    ToText { kind: ValueKind, reason: String },
    #[error("stored value {0:?} has no `|<type>` suffix")]
    MissingKind(String),
    #[error("unknown value type {0:?}")]
    UnknownKind(String),
}

/// A persisted scalar: its text form plus the kind it was captured as.
///
/// On disk this is `<text>|<kind>`, e.g. `120|f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub kind: ValueKind,
    pub text: String,
}

impl StoredValue {
    pub fn new(kind: ValueKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, ConversionError> {
        let (text, kind) = raw
            .rsplit_once('|')
            .ok_or_else(|| ConversionError::MissingKind(raw.to_string()))?;
        Ok(Self::new(kind.parse()?, text))
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.text, self.kind)
    }
}

pub trait ValueConverter {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError>;
    fn from_text(&self, text: &str, kind: ValueKind) -> Result<PropertyValue, ConversionError>;
}

/// Canonical `Display`/`FromStr` conversion for every [`ValueKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        Ok(match value {
            PropertyValue::I32(v) => v.to_string(),
            PropertyValue::I64(v) => v.to_string(),
            PropertyValue::U32(v) => v.to_string(),
            PropertyValue::U64(v) => v.to_string(),
            PropertyValue::F32(v) => v.to_string(),
            PropertyValue::F64(v) => v.to_string(),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Text(v) => v.clone(),
        })
    }

    fn from_text(&self, text: &str, kind: ValueKind) -> Result<PropertyValue, ConversionError> {
        fn parse<T>(text: &str, kind: ValueKind) -> Result<T, ConversionError>
        where
            T: std::str::FromStr,
            T::Err: fmt::Display,
        {
            text.trim()
                .parse::<T>()
                .map_err(|err| ConversionError::FromText {
                    text: text.to_string(),
                    kind,
                    reason: err.to_string(),
                })
        }

        Ok(match kind {
            ValueKind::I32 => PropertyValue::I32(parse(text, kind)?),
            ValueKind::I64 => PropertyValue::I64(parse(text, kind)?),
            ValueKind::U32 => PropertyValue::U32(parse(text, kind)?),
            ValueKind::U64 => PropertyValue::U64(parse(text, kind)?),
            ValueKind::F32 => PropertyValue::F32(parse(text, kind)?),
            ValueKind::F64 => PropertyValue::F64(parse(text, kind)?),
            ValueKind::Bool => PropertyValue::Bool(parse(text, kind)?),
            ValueKind::Text => PropertyValue::Text(text.to_string()),
        })
    }
}

/// Custom converters keyed by value kind, falling back to [`DefaultConverter`].
///
/// Only numeric kinds are persisted by default; registering a converter for
/// any other kind makes it eligible too.
pub struct ConverterRegistry {
    custom: HashMap<ValueKind, Box<dyn ValueConverter>>,
    default: DefaultConverter,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            default: DefaultConverter,
        }
    }

    pub fn register(&mut self, kind: ValueKind, converter: Box<dyn ValueConverter>) {
        tracing::debug!(%kind, "registered custom value converter");
        self.custom.insert(kind, converter);
    }

    pub fn has_custom(&self, kind: ValueKind) -> bool {
        self.custom.contains_key(&kind)
    }

    pub fn is_eligible(&self, kind: ValueKind) -> bool {
        ValueKind::NUMERIC.contains(&kind) || self.has_custom(kind)
    }

    pub fn converter_for(&self, kind: ValueKind) -> &dyn ValueConverter {
        match self.custom.get(&kind) {
            Some(converter) => converter.as_ref(),
            None => &self.default,
        }
    }

    pub fn to_stored(&self, value: &PropertyValue) -> Result<StoredValue, ConversionError> {
        let kind = value.kind();
        let text = self.converter_for(kind).to_text(value)?;
        Ok(StoredValue::new(kind, text))
    }

    /// Converts a stored value into `target`, the kind the property holds now.
    pub fn from_stored(
        &self,
        stored: &StoredValue,
        target: ValueKind,
    ) -> Result<PropertyValue, ConversionError> {
        if stored.kind != target {
            tracing::debug!(
                stored = %stored.kind,
                %target,
                "stored value kind differs from property kind; converting"
            );
        }
        self.converter_for(target).from_text(&stored.text, target)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
