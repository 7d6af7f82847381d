//! # Binary Log Decoder
//!
//! Decodes sync-framed binary dataflash records held fully in memory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use super::codec::Physical;
use super::message::{Message, RawField};
use super::protocol::*;
use super::schema::{Declaration, Layout, SchemaRegistry};
use super::LogSource;
use crate::error::{DfLogError, Result};

/// Binary dataflash log
#[derive(Debug)]
pub struct BinaryLog {
    /// Whole file content
    data: Bytes,
    /// Byte offset of the next record
    offset: usize,
    /// Layouts keyed by type id
    schema: SchemaRegistry<u8>,
    percent: f64,
}

impl BinaryLog {
    /// Create a decoder over an in-memory log
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
            schema: SchemaRegistry::with_bootstrap(DF_FMT_TYPE_ID),
            percent: 0.0,
        }
    }

    /// Read a binary log file into memory
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        debug!("Loaded binary log {} ({} bytes)", path.as_ref().display(), data.len());
        Ok(Self::new(data))
    }

    /// Layouts registered so far
    pub fn schema(&self) -> &SchemaRegistry<u8> {
        &self.schema
    }

    /// Current byte offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn register(&mut self, msg: &Message) -> Result<()> {
        let Some(decl) = Declaration::from_message(msg) else {
            return Ok(());
        };

        match u8::try_from(decl.type_id) {
            Ok(type_id) => {
                self.schema.declare(type_id, &decl)?;
            }
            Err(_) => trace!("Ignoring declaration of {} with type id {}", decl.name, decl.type_id),
        }
        Ok(())
    }
}

/// Split a record body into raw fields per the layout's codecs
///
/// `body` must be exactly `layout.payload_size()` bytes long.
fn unpack<'a>(layout: &Layout, mut body: &'a [u8]) -> Vec<RawField<'a>> {
    let mut fields = Vec::with_capacity(layout.codecs().len());

    for codec in layout.codecs() {
        let field = match codec.physical {
            Physical::I8 => RawField::Int(body.get_i8() as i64),
            Physical::U8 => RawField::Int(body.get_u8() as i64),
            Physical::I16 => RawField::Int(body.get_i16_le() as i64),
            Physical::U16 => RawField::Int(body.get_u16_le() as i64),
            Physical::I32 => RawField::Int(body.get_i32_le() as i64),
            Physical::U32 => RawField::Int(body.get_u32_le() as i64),
            Physical::I64 => RawField::Int(body.get_i64_le()),
            Physical::U64 => RawField::UInt(body.get_u64_le()),
            Physical::F32 => RawField::Float(body.get_f32_le() as f64),
            Physical::F64 => RawField::Float(body.get_f64_le()),
            Physical::Chars(len) => {
                let (blob, rest) = body.split_at(len);
                body = rest;
                RawField::Bytes(blob)
            }
        };
        fields.push(field);
    }

    fields
}

impl LogSource for BinaryLog {
    fn parse_next(&mut self) -> Result<Option<Message>> {
        let total = self.data.len();
        if total - self.offset < DF_HEADER_SIZE {
            return Ok(None);
        }

        let header = &self.data[self.offset..self.offset + DF_HEADER_SIZE];
        if header[0] != DF_HEAD1 || header[1] != DF_HEAD2 {
            debug!("Lost sync at offset {}, stopping", self.offset);
            return Ok(None);
        }
        let type_id = header[2];

        let layout: Arc<Layout> = self
            .schema
            .get(&type_id)
            .cloned()
            .ok_or(DfLogError::UnknownMessageType(type_id))?;

        let start = self.offset + DF_HEADER_SIZE;
        let remaining = total - start;
        let body_len = layout.length().saturating_sub(DF_HEADER_SIZE);
        if remaining < body_len {
            // truncated mid-record
            debug!("Log truncated inside {} record at offset {}", layout.name(), self.offset);
            return Ok(None);
        }

        if layout.length() < DF_HEADER_SIZE || layout.payload_size() != body_len {
            return Err(DfLogError::Unpack {
                message: layout.name().to_string(),
                format: layout.format().to_string(),
                expected: layout.payload_size(),
                available: body_len,
            });
        }

        let body = &self.data[start..start + body_len];
        let msg = Message::decode(layout.clone(), &unpack(&layout, body), true)?;

        if layout.is_declaration() {
            self.register(&msg)?;
        }

        self.offset = start + body_len;
        self.percent = 100.0 * (self.offset as f64 / total as f64);

        Ok(Some(msg))
    }

    fn rewind(&mut self) {
        self.offset = 0;
        self.percent = 0.0;
        self.schema = SchemaRegistry::with_bootstrap(DF_FMT_TYPE_ID);
    }

    fn percent(&self) -> f64 {
        self.percent
    }
}
