//! # Field Codec
//!
//! Fixed table translating one-character format codes into a physical
//! encoding, an optional fixed-point scale and a semantic output type.

/// Physical little-endian encoding of a binary field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Physical {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Fixed-length, NUL padded character blob
    Chars(usize),
}

impl Physical {
    /// Width of the field in a binary record, in bytes
    pub fn width(&self) -> usize {
        match self {
            Physical::I8 | Physical::U8 => 1,
            Physical::I16 | Physical::U16 => 2,
            Physical::I32 | Physical::U32 | Physical::F32 => 4,
            Physical::I64 | Physical::U64 | Physical::F64 => 8,
            Physical::Chars(len) => *len,
        }
    }
}

/// Type of the value a field decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Integer,
    Float,
    Text,
}

/// Decoding rule for one format character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCodec {
    /// Format character
    pub code: char,

    /// Physical encoding in binary logs
    pub physical: Physical,

    /// Fixed-point multiplier applied to scaled output
    pub scale: Option<f64>,

    /// Output type
    pub semantic: SemanticType,
}

/// Raw passthrough code: kept as read unless scaled output is requested
pub const PASSTHROUGH_CODE: char = 'M';

const fn codec(code: char, physical: Physical, scale: Option<f64>, semantic: SemanticType) -> FieldCodec {
    FieldCodec {
        code,
        physical,
        scale,
        semantic,
    }
}

/// Every supported format character
pub const CODEC_TABLE: [FieldCodec; 19] = [
    codec('b', Physical::I8, None, SemanticType::Integer),
    codec('B', Physical::U8, None, SemanticType::Integer),
    codec('h', Physical::I16, None, SemanticType::Integer),
    codec('H', Physical::U16, None, SemanticType::Integer),
    codec('i', Physical::I32, None, SemanticType::Integer),
    codec('I', Physical::U32, None, SemanticType::Integer),
    codec('q', Physical::I64, None, SemanticType::Integer),
    codec('Q', Physical::U64, None, SemanticType::Integer),
    codec('f', Physical::F32, None, SemanticType::Float),
    codec('d', Physical::F64, None, SemanticType::Float),
    codec('n', Physical::Chars(4), None, SemanticType::Text),
    codec('N', Physical::Chars(16), None, SemanticType::Text),
    codec('Z', Physical::Chars(64), None, SemanticType::Text),
    codec('c', Physical::I16, Some(0.01), SemanticType::Float),
    codec('C', Physical::U16, Some(0.01), SemanticType::Float),
    codec('e', Physical::I32, Some(0.01), SemanticType::Float),
    codec('E', Physical::U32, Some(0.01), SemanticType::Float),
    codec('L', Physical::I32, Some(1.0e-7), SemanticType::Float),
    codec(PASSTHROUGH_CODE, Physical::I8, None, SemanticType::Integer),
];

impl FieldCodec {
    /// Look up the codec for a format character
    ///
    /// # Returns
    ///
    /// * `Option<FieldCodec>` - Codec, or `None` if the character is unsupported
    pub fn lookup(code: char) -> Option<FieldCodec> {
        CODEC_TABLE.iter().find(|c| c.code == code).copied()
    }

    /// Binary width in bytes
    pub fn width(&self) -> usize {
        self.physical.width()
    }

    /// Whether this is the raw passthrough code
    pub fn is_passthrough(&self) -> bool {
        self.code == PASSTHROUGH_CODE
    }
}
