//! Helpers for building dataflash logs in tests

use dflog::dataflash::protocol::{DF_FMT_TYPE_ID, DF_HEAD1, DF_HEAD2};

/// Builds a binary log record by record
#[derive(Default)]
pub struct BinaryLogBuilder {
    data: Vec<u8>,
}

fn fixed(s: &str, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    out[..s.len()].copy_from_slice(s.as_bytes());
    out
}

impl BinaryLogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schema declaration
    pub fn declare(mut self, type_id: u8, length: u8, name: &str, format: &str, columns: &str) -> Self {
        self.data.extend_from_slice(&[DF_HEAD1, DF_HEAD2, DF_FMT_TYPE_ID, type_id, length]);
        self.data.extend(fixed(name, 4));
        self.data.extend(fixed(format, 16));
        self.data.extend(fixed(columns, 64));
        self
    }

    /// Append a record with a pre-encoded body
    pub fn record(mut self, type_id: u8, body: &[u8]) -> Self {
        self.data.extend_from_slice(&[DF_HEAD1, DF_HEAD2, type_id]);
        self.data.extend_from_slice(body);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Body of a `BIH` (Status, TimeMS, Week) GPS record
pub fn gps_body(status: u8, time_ms: u32, week: u16) -> Vec<u8> {
    let mut body = vec![status];
    body.extend_from_slice(&time_ms.to_le_bytes());
    body.extend_from_slice(&week.to_le_bytes());
    body
}

/// Body of a `ccC` (Roll, Pitch, Yaw) attitude record, centidegrees
pub fn att_body(roll: i16, pitch: i16, yaw: u16) -> Vec<u8> {
    let mut body = roll.to_le_bytes().to_vec();
    body.extend_from_slice(&pitch.to_le_bytes());
    body.extend_from_slice(&yaw.to_le_bytes());
    body
}

/// Body of a `Nf` (Name, Value) parameter record
pub fn parm_body(name: &str, value: f32) -> Vec<u8> {
    let mut body = fixed(name, 16);
    body.extend_from_slice(&value.to_le_bytes());
    body
}
