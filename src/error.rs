//! # Error Types
//!
//! Custom error types for dflog using `thiserror`.

use thiserror::Error;

/// Main error type for dflog
#[derive(Debug, Error)]
pub enum DfLogError {
    /// A schema declaration used a format character the codec table lacks
    #[error("Unsupported format char: '{code}' in message {message}")]
    UnsupportedFormatChar { message: String, code: char },

    /// A schema declaration whose column list does not match its format string
    #[error("Message {message} declares {codes} fields but {columns} column names")]
    ColumnMismatch {
        message: String,
        codes: usize,
        columns: usize,
    },

    /// Binary record referencing a type id with no registered layout
    #[error("Unknown message type {0:02x}")]
    UnknownMessageType(u8),

    /// Binary record body does not match its layout's physical size
    #[error("Failed to parse {message}/{format} with len {expected} (available {available})")]
    Unpack {
        message: String,
        format: String,
        expected: usize,
        available: usize,
    },

    /// Text field that cannot be read as its declared type
    #[error("Cannot parse field {field} of {message} from '{value}'")]
    FieldParse {
        message: String,
        field: String,
        value: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dflog
pub type Result<T> = std::result::Result<T, DfLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_char_names_type_and_char() {
        let err = DfLogError::UnsupportedFormatChar {
            message: "ATT".to_string(),
            code: 'X',
        };
        assert_eq!(err.to_string(), "Unsupported format char: 'X' in message ATT");
    }

    #[test]
    fn test_unpack_reports_lengths() {
        let err = DfLogError::Unpack {
            message: "GPS".to_string(),
            format: "BIH".to_string(),
            expected: 7,
            available: 4,
        };
        let text = err.to_string();
        assert!(text.contains("GPS/BIH"));
        assert!(text.contains('7'));
        assert!(text.contains('4'));
    }

    #[test]
    fn test_unknown_type_is_hex() {
        assert_eq!(
            DfLogError::UnknownMessageType(0x8A).to_string(),
            "Unknown message type 8a"
        );
    }
}
