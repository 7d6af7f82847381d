//! # Schema Registry
//!
//! Field layouts for every message type seen so far in a log. The registry
//! starts with the schema-declaration type only and grows as declarations
//! are decoded from the stream.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, trace};

use super::codec::FieldCodec;
use super::message::{Message, Value};
use super::protocol::*;
use crate::error::{DfLogError, Result};

/// Field layout of one message type
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    length: usize,
    format: String,
    columns: Vec<String>,
    codecs: Vec<FieldCodec>,
}

impl Layout {
    /// Build a layout from a declaration
    ///
    /// # Arguments
    ///
    /// * `name` - Message type name
    /// * `length` - Declared binary record length including the header
    /// * `format` - One format character per field (parsing stops at NUL)
    /// * `columns` - Comma separated field names
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A format character has no codec
    /// - The number of columns differs from the number of format characters
    pub fn new(name: &str, length: usize, format: &str, columns: &str) -> Result<Self> {
        let format: String = format.chars().take_while(|&c| c != '\0').collect();

        let codecs = format
            .chars()
            .map(|code| {
                FieldCodec::lookup(code).ok_or_else(|| DfLogError::UnsupportedFormatChar {
                    message: name.to_string(),
                    code,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let columns: Vec<String> = if columns.is_empty() {
            Vec::new()
        } else {
            columns.split(',').map(str::to_string).collect()
        };

        if columns.len() != codecs.len() {
            return Err(DfLogError::ColumnMismatch {
                message: name.to_string(),
                codes: codecs.len(),
                columns: columns.len(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            length,
            format,
            columns,
            codecs,
        })
    }

    /// Built-in layout of the schema-declaration record
    pub fn bootstrap() -> Self {
        Self {
            name: DF_FMT_NAME.to_string(),
            length: DF_FMT_LENGTH,
            format: DF_FMT_FORMAT.to_string(),
            columns: DF_FMT_COLUMNS.split(',').map(str::to_string).collect(),
            codecs: DF_FMT_FORMAT.chars().filter_map(FieldCodec::lookup).collect(),
        }
    }

    /// Layout with no decoded fields, for records assembled in code
    pub(crate) fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            length: 0,
            format: String::new(),
            columns: Vec::new(),
            codecs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared binary record length including the 3 byte header
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn codecs(&self) -> &[FieldCodec] {
        &self.codecs
    }

    /// Sum of the physical widths of all fields
    pub fn payload_size(&self) -> usize {
        self.codecs.iter().map(FieldCodec::width).sum()
    }

    /// Whether this is the schema-declaration type
    pub fn is_declaration(&self) -> bool {
        self.name == DF_FMT_NAME
    }
}

/// Contents of a decoded schema-declaration record
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub type_id: i64,
    pub length: usize,
    pub name: String,
    pub format: String,
    pub columns: String,
}

impl Declaration {
    /// Read a declaration from a decoded `FMT` record
    ///
    /// Fields are taken by position (type, length, name, format, columns),
    /// so the record's own column names do not matter.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if !msg.layout().is_declaration() {
            return None;
        }

        let values = msg.values();
        if values.len() < 5 {
            return None;
        }

        Some(Self {
            type_id: values[0].as_i64()?,
            length: usize::try_from(values[1].as_i64()?).ok()?,
            name: text_of(&values[2])?,
            format: text_of(&values[3])?,
            columns: text_of(&values[4])?,
        })
    }

    /// Build the layout this declaration describes
    pub fn to_layout(&self) -> Result<Layout> {
        Layout::new(&self.name, self.length, &self.format, &self.columns)
    }
}

fn text_of(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Mapping from message-type key to layout
///
/// Binary logs key on the one byte type id, text logs on the type name.
#[derive(Debug, Clone)]
pub struct SchemaRegistry<K> {
    layouts: HashMap<K, Arc<Layout>>,
}

impl<K: Eq + Hash + Debug> SchemaRegistry<K> {
    /// Create a registry holding only the schema-declaration layout
    pub fn with_bootstrap(fmt_key: K) -> Self {
        let mut layouts = HashMap::new();
        layouts.insert(fmt_key, Arc::new(Layout::bootstrap()));
        Self { layouts }
    }

    /// Look up the layout registered for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&Arc<Layout>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.layouts.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.layouts.contains_key(key)
    }

    /// Register the layout described by `decl` under `key`
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - `true` if added, `false` if `key` was already known
    ///
    /// # Errors
    ///
    /// Returns error if the declaration does not describe a valid layout
    pub fn declare(&mut self, key: K, decl: &Declaration) -> Result<bool> {
        if self.layouts.contains_key(&key) {
            trace!("Ignoring duplicate declaration of {:?} ({})", key, decl.name);
            return Ok(false);
        }

        let layout = decl.to_layout()?;
        debug!(
            "Registered message type {:?}: {} format={} columns={}",
            key,
            layout.name(),
            layout.format(),
            layout.columns().join(",")
        );
        self.layouts.insert(key, Arc::new(layout));
        Ok(true)
    }

    /// Number of registered types, bootstrap included
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_layout() {
        let fmt = Layout::bootstrap();
        assert_eq!(fmt.name(), "FMT");
        assert_eq!(fmt.length(), DF_FMT_LENGTH);
        assert_eq!(fmt.codecs().len(), 5);
        assert_eq!(fmt.columns(), ["Type", "Length", "Name", "Format", "Columns"]);
        assert_eq!(fmt.payload_size() + DF_HEADER_SIZE, DF_FMT_LENGTH);
        assert!(fmt.is_declaration());
    }

    #[test]
    fn test_layout_new() {
        let layout = Layout::new("ATT", 19, "IccC", "TimeMS,Roll,Pitch,Yaw").unwrap();
        assert_eq!(layout.payload_size(), 10);
        assert_eq!(layout.columns().len(), 4);
        assert!(!layout.is_declaration());
    }

    #[test]
    fn test_layout_format_stops_at_nul() {
        let layout = Layout::new("CURR", 7, "Hh\0\0\0", "Thr,Volt").unwrap();
        assert_eq!(layout.format(), "Hh");
        assert_eq!(layout.codecs().len(), 2);
    }

    #[test]
    fn test_layout_unknown_code() {
        let err = Layout::new("BAD", 10, "BXf", "A,B,C").unwrap_err();
        match err {
            DfLogError::UnsupportedFormatChar { message, code } => {
                assert_eq!(message, "BAD");
                assert_eq!(code, 'X');
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_layout_column_mismatch() {
        let result = Layout::new("ATT", 19, "IccC", "TimeMS,Roll");
        assert!(matches!(result, Err(DfLogError::ColumnMismatch { codes: 4, columns: 2, .. })));
    }

    #[test]
    fn test_layout_empty_structure() {
        let layout = Layout::new("NONE", 3, "", "").unwrap();
        assert!(layout.columns().is_empty());
        assert_eq!(layout.payload_size(), 0);
    }

    #[test]
    fn test_registry_declare_and_duplicate() {
        let mut registry = SchemaRegistry::with_bootstrap(DF_FMT_TYPE_ID);
        assert_eq!(registry.len(), 1);

        let decl = Declaration {
            type_id: 130,
            length: 12,
            name: "GPS".to_string(),
            format: "BIH".to_string(),
            columns: "Status,TimeMS,Week".to_string(),
        };
        assert!(registry.declare(130, &decl).unwrap());

        let other = Declaration {
            format: "B".to_string(),
            columns: "Status".to_string(),
            ..decl.clone()
        };
        assert!(!registry.declare(130, &other).unwrap());

        assert_eq!(registry.get(&130).unwrap().format(), "BIH");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_keyed_by_name() {
        let mut registry = SchemaRegistry::with_bootstrap(DF_FMT_NAME.to_string());
        assert!(registry.contains("FMT"));
        assert!(!registry.contains("ATT"));

        let decl = Declaration {
            type_id: 1,
            length: 0,
            name: "ATT".to_string(),
            format: "ff".to_string(),
            columns: "Roll,Pitch".to_string(),
        };
        registry.declare(decl.name.clone(), &decl).unwrap();
        assert_eq!(registry.get("ATT").unwrap().columns(), ["Roll", "Pitch"]);
    }

    #[test]
    fn test_registry_rejects_bad_declaration() {
        let mut registry = SchemaRegistry::with_bootstrap(DF_FMT_TYPE_ID);
        let decl = Declaration {
            type_id: 140,
            length: 5,
            name: "BAD".to_string(),
            format: "Bx".to_string(),
            columns: "A,B".to_string(),
        };
        assert!(registry.declare(140, &decl).is_err());
        assert!(!registry.contains(&140));
    }
}
