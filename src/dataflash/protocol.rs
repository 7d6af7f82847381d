//! # Dataflash Protocol Constants
//!
//! Wire-level definitions shared by the binary and text decoders.

/// First binary sync byte
pub const DF_HEAD1: u8 = 0xA3;

/// Second binary sync byte
pub const DF_HEAD2: u8 = 0x95;

/// Binary record header size: sync(2) + type(1)
pub const DF_HEADER_SIZE: usize = 3;

/// Reserved type id of the schema-declaration record
pub const DF_FMT_TYPE_ID: u8 = 0x80;

/// Total length of a schema-declaration record (header + 1 + 1 + 4 + 16 + 64)
pub const DF_FMT_LENGTH: usize = 89;

/// Name of the schema-declaration message type
pub const DF_FMT_NAME: &str = "FMT";

/// Format string of the schema-declaration record
pub const DF_FMT_FORMAT: &str = "BBnNZ";

/// Column names of the schema-declaration record
pub const DF_FMT_COLUMNS: &str = "Type,Length,Name,Format,Columns";

/// Text log field separator
pub const TEXT_SEPARATOR: &str = ", ";

/// Prefix every text schema-declaration line starts with
pub const TEXT_FMT_TAG: &str = "FMT, ";

/// Bytes inspected when deciding whether a file is a text log
pub const TEXT_PROBE_BYTES: usize = 8000;

/// Message types that may carry an absolute GPS time
pub const GPS_MESSAGE_TYPES: [&str; 2] = ["GPS", "GPS2"];

/// Unix time of the GPS epoch (1980-01-06 00:00:00 UTC), in seconds
pub const GPS_EPOCH_UNIX_SECS: f64 = 86400.0 * (10.0 * 365.0 + 2.0 + 1.0 + 6.0 - 2.0);

/// Seconds in a GPS week
pub const GPS_WEEK_SECS: f64 = 86400.0 * 7.0;

/// Fixed GPS-to-UTC leap second correction applied to week-based times
pub const GPS_LEAP_SECONDS: f64 = 15.0;

/// Parameter-declaration message type
pub const PARM_MESSAGE: &str = "PARM";

/// Flight-mode change message type
pub const MODE_MESSAGE: &str = "MODE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(DF_HEAD1, 0xA3);
        assert_eq!(DF_HEAD2, 0x95);
        assert_eq!(DF_FMT_TYPE_ID, 0x80);
        assert_eq!(DF_FMT_LENGTH, DF_HEADER_SIZE + 1 + 1 + 4 + 16 + 64);
    }

    #[test]
    fn test_gps_epoch() {
        // 1980-01-06T00:00:00Z
        assert_eq!(GPS_EPOCH_UNIX_SECS, 315_964_800.0);
        assert_eq!(GPS_WEEK_SECS, 604_800.0);
    }

    #[test]
    fn test_fmt_tag_matches_separator() {
        assert_eq!(TEXT_FMT_TAG, format!("{}{}", DF_FMT_NAME, TEXT_SEPARATOR));
    }
}
