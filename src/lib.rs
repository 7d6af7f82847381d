//! # dflog
//!
//! Decode ArduPilot dataflash logs into timestamped, named-field messages.
//!
//! Both physical encodings are supported: the sync-framed binary format and
//! the line-oriented text format. Each log declares its own schema through
//! `FMT` records. Records without their own time are timestamped by
//! interpolating between GPS fixes.

pub mod config;
pub mod error;
pub mod dataflash;
pub mod reader;
pub mod modes;
pub mod condition;

pub use dataflash::message::{Message, Value};
pub use error::{DfLogError, Result};
pub use reader::{DfReader, LogFormat};
