//! # Text Log Decoder
//!
//! Decodes `TYPE, field, field, ...` dataflash text logs. Values are
//! already human readable, so fixed-point multipliers are never applied.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use tracing::{debug, trace};

use super::message::{Message, RawField, Value};
use super::protocol::*;
use super::schema::{Declaration, SchemaRegistry};
use super::LogSource;
use crate::error::{DfLogError, Result};

/// Name of the computed field holding the source line number
pub const LINE_FIELD: &str = "line";

/// Check whether a file looks like a text log
///
/// A text log has a `FMT, ` declaration within the first `probe_bytes` bytes.
///
/// # Errors
///
/// Returns error if the file cannot be read
pub fn is_text_log<P: AsRef<Path>>(path: P, probe_bytes: usize) -> Result<bool> {
    let mut head = Vec::with_capacity(probe_bytes);
    File::open(path)?.take(probe_bytes as u64).read_to_end(&mut head)?;
    Ok(looks_like_text_log(&head))
}

/// Check an in-memory prefix of a file for a text declaration
pub fn looks_like_text_log(head: &[u8]) -> bool {
    head.windows(TEXT_FMT_TAG.len()).any(|w| w == TEXT_FMT_TAG.as_bytes())
}

/// Text dataflash log
#[derive(Debug)]
pub struct TextLog {
    lines: Vec<String>,
    /// Index of the next line to read
    line: usize,
    /// Layouts keyed by type name
    schema: SchemaRegistry<String>,
    percent: f64,
}

impl TextLog {
    /// Create a decoder over the content of a text log
    pub fn new(content: &str) -> Self {
        let mut log = Self {
            lines: content.lines().map(str::to_string).collect(),
            line: 0,
            schema: SchemaRegistry::with_bootstrap(DF_FMT_NAME.to_string()),
            percent: 0.0,
        };
        log.rewind();
        log
    }

    /// Read a text log file into memory
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let content = String::from_utf8_lossy(&bytes);
        let log = Self::new(&content);
        debug!("Loaded text log {} ({} lines)", path.as_ref().display(), log.lines.len());
        Ok(log)
    }

    /// Layouts registered so far
    pub fn schema(&self) -> &SchemaRegistry<String> {
        &self.schema
    }

    /// Lines consumed so far; the one-based number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }

    fn update_percent(&mut self) {
        self.percent = if self.lines.is_empty() {
            100.0
        } else {
            100.0 * (self.line as f64 / self.lines.len() as f64)
        };
    }

    /// Decode one split line, or `None` if it should be skipped
    fn decode_line(&mut self, elements: &[&str]) -> Result<Option<Message>> {
        let Some(layout) = self.schema.get(elements[0]).cloned() else {
            trace!("Line {}: no format for {}", self.line, elements[0]);
            return Ok(None);
        };

        if elements.len() < layout.codecs().len() + 1 {
            trace!("Line {}: not enough columns for {}", self.line, layout.name());
            return Ok(None);
        }

        let raw: Vec<RawField<'_>> = elements[1..].iter().map(|s| RawField::Text(s)).collect();
        let mut msg = match Message::decode(layout.clone(), &raw, false) {
            Ok(msg) => msg,
            Err(DfLogError::FieldParse { field, value, .. }) => {
                trace!("Line {}: bad value '{}' for {}.{}", self.line, value, layout.name(), field);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if layout.is_declaration() {
            if let Some(decl) = Declaration::from_message(&msg) {
                self.schema.declare(decl.name.clone(), &decl)?;
            }
        }

        msg.append_field(LINE_FIELD, Value::Int(self.line as i64));
        Ok(Some(msg))
    }
}

/// Split a line into fields, repairing the collapsed empty-structure case
fn split_line(line: &str) -> Vec<&str> {
    let mut elements: Vec<&str> = line.split(TEXT_SEPARATOR).collect();

    // "FMT, 1, 3, NONE, ," declares a type with no fields
    if elements.len() == 5 && elements[4] == "," {
        elements[4] = "";
        elements.push("");
    }

    elements
}

impl LogSource for TextLog {
    fn parse_next(&mut self) -> Result<Option<Message>> {
        while self.line < self.lines.len() {
            let current = self.lines[self.line].trim_end().to_string();
            self.line += 1;
            self.update_percent();

            let elements = split_line(&current);
            if elements.len() < 2 {
                continue;
            }

            if let Some(msg) = self.decode_line(&elements)? {
                return Ok(Some(msg));
            }
        }

        Ok(None)
    }

    fn rewind(&mut self) {
        self.schema = SchemaRegistry::with_bootstrap(DF_FMT_NAME.to_string());
        self.line = self
            .lines
            .iter()
            .position(|l| l.starts_with(TEXT_FMT_TAG))
            .unwrap_or(self.lines.len());
        self.percent = 0.0;
    }

    fn percent(&self) -> f64 {
        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
garbage before the log
FMT, 128, 89, FMT, BBnNZ, Type,Length,Name,Format,Columns
FMT, 129, 23, PARM, Nf, Name,Value
FMT, 130, 19, ATT, IccC, TimeMS,Roll,Pitch,Yaw
PARM, RTL_ALT, 3.5
ATT, 1000, 1.5, -2.25, 359.99
";

    fn collect(log: &mut TextLog) -> Vec<Message> {
        let mut out = Vec::new();
        while let Some(msg) = log.parse_next().unwrap() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_starts_at_first_declaration() {
        let log = TextLog::new(LOG);
        assert_eq!(log.line(), 1);
    }

    #[test]
    fn test_decode_sequence() {
        let mut log = TextLog::new(LOG);
        let msgs = collect(&mut log);

        let types: Vec<&str> = msgs.iter().map(Message::get_type).collect();
        assert_eq!(types, ["FMT", "FMT", "FMT", "PARM", "ATT"]);

        let att = &msgs[4];
        assert_eq!(att.field_names(), ["TimeMS", "Roll", "Pitch", "Yaw", "line"]);
        assert_eq!(att.get_i64("TimeMS"), Some(1000));
        // never scaled
        assert_eq!(att.get_f64("Roll"), Some(1.5));
        assert_eq!(att.get_f64("Yaw"), Some(359.99));
        assert_eq!(att.get_i64("line"), Some(6));

        assert_eq!(msgs[3].get_str("Name"), Some("RTL_ALT"));
        assert_eq!(log.percent(), 100.0);
    }

    #[test]
    fn test_unknown_type_skipped() {
        let content = "\
FMT, 128, 89, FMT, BBnNZ, Type,Length,Name,Format,Columns
ATT, 1000, 1.5, -2.25, 359.99
FMT, 130, 19, ATT, IccC, TimeMS,Roll,Pitch,Yaw
ATT, 2000, 1.5, -2.25, 359.99
";
        let mut log = TextLog::new(content);
        let msgs = collect(&mut log);
        let atts: Vec<&Message> = msgs.iter().filter(|m| m.get_type() == "ATT").collect();
        assert_eq!(atts.len(), 1);
        assert_eq!(atts[0].get_i64("TimeMS"), Some(2000));
    }

    #[test]
    fn test_short_and_malformed_lines_skipped() {
        let content = "\
FMT, 130, 19, ATT, IccC, TimeMS,Roll,Pitch,Yaw

x
ATT, 1000, 1.5
ATT, oops, 1.5, 2.0, 3.0
ATT, 3000, 1.5, 2.0, 3.0
";
        let mut log = TextLog::new(content);
        let msgs = collect(&mut log);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].get_i64("TimeMS"), Some(3000));
        assert_eq!(msgs[1].get_i64("line"), Some(6));
    }

    #[test]
    fn test_last_line_is_decoded() {
        let content = "FMT, 130, 19, ATT, IccC, TimeMS,Roll,Pitch,Yaw\nATT, 1, 2, 3, 4";
        let mut log = TextLog::new(content);
        let msgs = collect(&mut log);
        assert_eq!(msgs.last().unwrap().get_type(), "ATT");
    }

    #[test]
    fn test_empty_structure_declaration() {
        assert_eq!(split_line("FMT, 1, 3, NONE, ,"), ["FMT", "1", "3", "NONE", "", ""]);

        let content = "FMT, 1, 3, NONE, ,\nNONE, \n";
        let mut log = TextLog::new(content);
        let fmt = log.parse_next().unwrap().unwrap();
        assert_eq!(fmt.get_str("Name"), Some("NONE"));
        assert!(log.schema().get("NONE").unwrap().columns().is_empty());
    }

    #[test]
    fn test_bad_declaration_is_fatal() {
        let content = "FMT, 130, 19, BAD, IX, A,B\n";
        let mut log = TextLog::new(content);
        assert!(matches!(
            log.parse_next(),
            Err(DfLogError::UnsupportedFormatChar { code: 'X', .. })
        ));
    }

    #[test]
    fn test_passthrough_mode_is_text() {
        let content = "\
FMT, 131, 5, MODE, Mh, Mode,ModeNum
MODE, Loiter, 5
";
        let mut log = TextLog::new(content);
        log.parse_next().unwrap();
        let mode = log.parse_next().unwrap().unwrap();
        assert_eq!(mode.get_str("Mode"), Some("Loiter"));
        assert_eq!(mode.get_i64("ModeNum"), Some(5));
    }

    #[test]
    fn test_rewind_forgets_schema() {
        let mut log = TextLog::new(LOG);
        collect(&mut log);
        assert!(log.schema().contains("ATT"));

        log.rewind();
        assert!(!log.schema().contains("ATT"));
        assert_eq!(collect(&mut log).len(), 5);
    }

    #[test]
    fn test_no_declaration_at_all() {
        let mut log = TextLog::new("ATT, 1, 2, 3, 4\n");
        assert!(log.parse_next().unwrap().is_none());
    }

    #[test]
    fn test_is_text_log() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut text = NamedTempFile::new().unwrap();
        text.write_all(LOG.as_bytes()).unwrap();
        text.flush().unwrap();
        assert!(is_text_log(text.path(), TEXT_PROBE_BYTES).unwrap());

        let mut binary = NamedTempFile::new().unwrap();
        binary.write_all(&[DF_HEAD1, DF_HEAD2, DF_FMT_TYPE_ID, 0, 0]).unwrap();
        binary.flush().unwrap();
        assert!(!is_text_log(binary.path(), TEXT_PROBE_BYTES).unwrap());

        // declaration outside the probe window
        assert!(!looks_like_text_log(&LOG.as_bytes()[..10]));
    }
}
