//! # Dataflash Module
//!
//! Decoding of ArduPilot dataflash logs.
//!
//! This module handles:
//! - The format-character codec table
//! - The in-stream schema registry (`FMT` records)
//! - Binary logs (sync-framed records, little-endian fields)
//! - Text logs (`TYPE, field, field, ...` lines)

pub mod protocol;
pub mod codec;
pub mod schema;
pub mod message;
pub mod binary;
pub mod text;

use crate::error::Result;
use message::Message;

/// A physical log decoder producing one message at a time
///
/// Implemented by [`binary::BinaryLog`] and [`text::TextLog`]; the reader
/// layers timestamp reconstruction and session state on top.
pub trait LogSource {
    /// Decode the next message
    ///
    /// # Returns
    ///
    /// * `Ok(Some(msg))` - Next message
    /// * `Ok(None)` - End of stream, including a record truncated at end of file
    ///
    /// # Errors
    ///
    /// Returns error if the log is structurally unreadable
    fn parse_next(&mut self) -> Result<Option<Message>>;

    /// Restart from the beginning of the log with a fresh schema registry
    fn rewind(&mut self);

    /// Read progress, 0 to 100
    fn percent(&self) -> f64;
}

impl<S: LogSource + ?Sized> LogSource for Box<S> {
    fn parse_next(&mut self) -> Result<Option<Message>> {
        (**self).parse_next()
    }

    fn rewind(&mut self) {
        (**self).rewind()
    }

    fn percent(&self) -> f64 {
        (**self).percent()
    }
}
