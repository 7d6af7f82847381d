//! # Decoded Messages
//!
//! Turns raw field values plus a [`Layout`] into a named-field record.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::codec::{FieldCodec, SemanticType};
use super::schema::Layout;
use crate::error::{DfLogError, Result};

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value; text is not converted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Integer view of the value; floats are truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Float(v) => Some(*v as i64),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One field as produced by a physical decoder, before typing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawField<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Fixed-length character blob from a binary record
    Bytes(&'a [u8]),
    /// Unparsed token from a text line
    Text(&'a str),
}

/// A decoded log record
///
/// Fields keep declaration order; computed fields appended later go to the
/// end. Field names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    layout: Arc<Layout>,
    names: Vec<String>,
    values: Vec<Value>,
    timestamp: Option<f64>,
}

impl Message {
    /// Decode raw fields against `layout`
    ///
    /// # Arguments
    ///
    /// * `layout` - Layout of the message type
    /// * `raw` - One raw value per layout field
    /// * `apply_scaling` - Apply fixed-point multipliers (binary logs)
    ///
    /// # Errors
    ///
    /// Returns `DfLogError::FieldParse` if a raw value cannot be read as its
    /// field's type, or if fewer raw values than fields are supplied.
    pub fn decode(layout: Arc<Layout>, raw: &[RawField<'_>], apply_scaling: bool) -> Result<Self> {
        let mut values = Vec::with_capacity(layout.codecs().len());

        for (i, (codec, column)) in layout.codecs().iter().zip(layout.columns()).enumerate() {
            let field = raw.get(i).ok_or_else(|| DfLogError::FieldParse {
                message: layout.name().to_string(),
                field: column.clone(),
                value: String::new(),
            })?;

            let value = decode_field(codec, *field, apply_scaling).ok_or_else(|| DfLogError::FieldParse {
                message: layout.name().to_string(),
                field: column.clone(),
                value: raw_to_string(field),
            })?;
            values.push(value);
        }

        Ok(Self {
            names: layout.columns().to_vec(),
            layout,
            values,
            timestamp: None,
        })
    }

    /// Message with no decoded fields, populated through [`Message::append_field`]
    pub fn synthetic(name: &str) -> Self {
        Self {
            layout: Arc::new(Layout::empty(name)),
            names: Vec::new(),
            values: Vec::new(),
            timestamp: None,
        }
    }

    /// Message type name
    pub fn get_type(&self) -> &str {
        self.layout.name()
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// All current field names, appended fields included
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    /// All current values, in field order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over `(name, value)` pairs in field order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names.iter().position(|n| n == name).map(|i| &self.values[i])
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Add a computed field, or replace the value of an existing one
    pub fn append_field(&mut self, name: &str, value: Value) {
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.values[i] = value,
            None => {
                self.names.push(name.to_string());
                self.values.push(value);
            }
        }
    }

    /// Reconstructed absolute time in seconds, once assigned
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: f64) {
        self.timestamp = Some(timestamp);
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.get_type())?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} : {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// JSON key holding the record type
const TYPE_KEY: &str = "mavpackettype";

/// JSON key holding the reconstructed time
const TIMESTAMP_KEY: &str = "timestamp";

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // a column of the same name wins over the meta key
        let with_type = !self.has_field(TYPE_KEY);
        let with_timestamp = !self.has_field(TIMESTAMP_KEY);
        let len = self.names.len() + usize::from(with_type) + usize::from(with_timestamp);

        let mut map = serializer.serialize_map(Some(len))?;
        if with_type {
            map.serialize_entry(TYPE_KEY, self.get_type())?;
        }
        if with_timestamp {
            map.serialize_entry(TIMESTAMP_KEY, &self.timestamp)?;
        }
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Truncate at the first NUL
pub fn null_term(s: &str) -> &str {
    match s.find('\0') {
        Some(idx) => &s[..idx],
        None => s,
    }
}

fn decode_field(codec: &FieldCodec, raw: RawField<'_>, apply_scaling: bool) -> Option<Value> {
    if codec.semantic == SemanticType::Text {
        return match raw {
            RawField::Bytes(bytes) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Some(Value::Text(String::from_utf8_lossy(&bytes[..end]).into_owned()))
            }
            RawField::Text(s) => Some(Value::Text(null_term(s).to_string())),
            _ => None,
        };
    }

    // Text logs keep the passthrough code as written
    if codec.is_passthrough() && !apply_scaling {
        if let RawField::Text(s) = raw {
            return Some(Value::Text(s.to_string()));
        }
    }

    let value = match raw {
        RawField::Int(v) => Value::Int(v),
        RawField::UInt(v) => Value::UInt(v),
        RawField::Float(v) => Value::Float(v),
        RawField::Text(s) => parse_text(codec.semantic, s.trim())?,
        RawField::Bytes(_) => return None,
    };

    match (codec.scale, apply_scaling) {
        (Some(scale), true) => Some(Value::Float(value.as_f64()? * scale)),
        _ if codec.semantic == SemanticType::Float => Some(Value::Float(value.as_f64()?)),
        _ => Some(value),
    }
}

fn parse_text(semantic: SemanticType, s: &str) -> Option<Value> {
    match semantic {
        SemanticType::Integer => s
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| s.parse::<u64>().map(Value::UInt))
            .ok(),
        SemanticType::Float => s.parse::<f64>().map(Value::Float).ok(),
        SemanticType::Text => Some(Value::Text(s.to_string())),
    }
}

fn raw_to_string(raw: &RawField<'_>) -> String {
    match raw {
        RawField::Int(v) => v.to_string(),
        RawField::UInt(v) => v.to_string(),
        RawField::Float(v) => v.to_string(),
        RawField::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        RawField::Text(s) => s.to_string(),
    }
}
