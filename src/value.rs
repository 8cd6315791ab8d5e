//! The dynamically-typed value model and its scalar wire codecs.
//!
//! Sixteen wire variants share one tagged union; `Bool` covers the two
//! boolean wire ids (1 = true, 2 = false). The type id on the wire is
//! authoritative; there is no reflection anywhere in the codecs.
//!
//! Two payload layouts exist. V1 inlines scalars at fixed little-endian
//! width. V2 and v3 share the "pooled" layout: integers shrink to varints
//! (signed ones as a magnitude, the sign travelling out of band), floats
//! stay fixed, strings and byte arrays are length-prefixed.

use alloc::string::String;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FluxionError;
use crate::header::TextEncoding;
use crate::io::{ByteSink, ByteSource};
use crate::text;
use crate::varint::{read_varint, read_varint_u32, write_varint};

/// Wire type ids 0..=15 (Type Table).
pub const TYPE_NULL: u8 = 0;
pub const TYPE_TRUE: u8 = 1;
pub const TYPE_FALSE: u8 = 2;
pub const TYPE_U8: u8 = 3;
pub const TYPE_I8: u8 = 4;
pub const TYPE_CHAR: u8 = 5;
pub const TYPE_I16: u8 = 6;
pub const TYPE_U16: u8 = 7;
pub const TYPE_I32: u8 = 8;
pub const TYPE_U32: u8 = 9;
pub const TYPE_I64: u8 = 10;
pub const TYPE_U64: u8 = 11;
pub const TYPE_F32: u8 = 12;
pub const TYPE_F64: u8 = 13;
pub const TYPE_STR: u8 = 14;
pub const TYPE_BYTES: u8 = 15;

/// A node or attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    U8(u8),
    I8(i8),
    /// A single UTF-16 code unit.
    Char(u16),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Absolute epsilons for float comparison in deep equality and the v3
/// dedup pass. Both default to 0.001.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub f32_epsilon: f32,
    pub f64_epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            f32_epsilon: 0.001,
            f64_epsilon: 0.001,
        }
    }
}

impl Value {
    /// Wire type id per the Type Table.
    pub fn wire_type(&self) -> u8 {
        match self {
            Value::Null => TYPE_NULL,
            Value::Bool(true) => TYPE_TRUE,
            Value::Bool(false) => TYPE_FALSE,
            Value::U8(_) => TYPE_U8,
            Value::I8(_) => TYPE_I8,
            Value::Char(_) => TYPE_CHAR,
            Value::I16(_) => TYPE_I16,
            Value::U16(_) => TYPE_U16,
            Value::I32(_) => TYPE_I32,
            Value::U32(_) => TYPE_U32,
            Value::I64(_) => TYPE_I64,
            Value::U64(_) => TYPE_U64,
            Value::F32(_) => TYPE_F32,
            Value::F64(_) => TYPE_F64,
            Value::Str(_) => TYPE_STR,
            Value::Bytes(_) => TYPE_BYTES,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The canonical empty/zero value for a wire type id.
    pub fn canonical_default(type_id: u8) -> Result<Value, FluxionError> {
        Ok(match type_id {
            TYPE_NULL => Value::Null,
            TYPE_TRUE => Value::Bool(true),
            TYPE_FALSE => Value::Bool(false),
            TYPE_U8 => Value::U8(0),
            TYPE_I8 => Value::I8(0),
            TYPE_CHAR => Value::Char(0),
            TYPE_I16 => Value::I16(0),
            TYPE_U16 => Value::U16(0),
            TYPE_I32 => Value::I32(0),
            TYPE_U32 => Value::U32(0),
            TYPE_I64 => Value::I64(0),
            TYPE_U64 => Value::U64(0),
            TYPE_F32 => Value::F32(0.0),
            TYPE_F64 => Value::F64(0.0),
            TYPE_STR => Value::Str(String::new()),
            TYPE_BYTES => Value::Bytes(Vec::new()),
            other => return Err(FluxionError::UnknownValueType(other)),
        })
    }

    /// True when the value equals its canonical empty/zero form. These are
    /// the values the v2 unique flag encodes without a pool entry.
    pub fn is_canonical_default(&self) -> bool {
        match self {
            Value::Null | Value::Bool(_) => true,
            Value::U8(v) => *v == 0,
            Value::I8(v) => *v == 0,
            Value::Char(v) => *v == 0,
            Value::I16(v) => *v == 0,
            Value::U16(v) => *v == 0,
            Value::I32(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
        }
    }

    /// True for i16/i32/i64, the sign-magnitude types of the pooled layout.
    pub fn is_signed_varint(&self) -> bool {
        matches!(self, Value::I16(_) | Value::I32(_) | Value::I64(_))
    }

    /// Negative sign for the sign-magnitude types; false for everything else.
    pub fn is_negative(&self) -> bool {
        match self {
            Value::I16(v) => *v < 0,
            Value::I32(v) => *v < 0,
            Value::I64(v) => *v < 0,
            _ => false,
        }
    }

    /// Structural equality with float tolerance. Values of different wire
    /// types are never equal; floats match when their difference is within
    /// the epsilon (or they are bit-identical, which also covers NaN).
    pub fn approx_eq(&self, other: &Value, tolerance: &Tolerance) -> bool {
        match (self, other) {
            (Value::F32(a), Value::F32(b)) => {
                a.to_bits() == b.to_bits() || (a - b).abs() <= tolerance.f32_epsilon
            }
            (Value::F64(a), Value::F64(b)) => {
                a.to_bits() == b.to_bits() || (a - b).abs() <= tolerance.f64_epsilon
            }
            _ => self == other,
        }
    }
}

// -----------------------------------------------------------------------------
// V1 payload codec (fixed little-endian widths)
// -----------------------------------------------------------------------------

/// Writes the v1 inline payload for `value`.
pub fn write_v1_payload(value: &Value, sink: &mut ByteSink, encoding: TextEncoding) {
    match value {
        Value::Null | Value::Bool(_) => {}
        Value::U8(v) => sink.write_u8(*v),
        Value::I8(v) => sink.write_u8(*v as u8),
        Value::Char(v) | Value::U16(v) => {
            let mut b = [0u8; 2];
            LittleEndian::write_u16(&mut b, *v);
            sink.write_all(&b);
        }
        Value::I16(v) => {
            let mut b = [0u8; 2];
            LittleEndian::write_i16(&mut b, *v);
            sink.write_all(&b);
        }
        Value::I32(v) => {
            let mut b = [0u8; 4];
            LittleEndian::write_i32(&mut b, *v);
            sink.write_all(&b);
        }
        Value::U32(v) => {
            let mut b = [0u8; 4];
            LittleEndian::write_u32(&mut b, *v);
            sink.write_all(&b);
        }
        Value::I64(v) => {
            let mut b = [0u8; 8];
            LittleEndian::write_i64(&mut b, *v);
            sink.write_all(&b);
        }
        Value::U64(v) => {
            let mut b = [0u8; 8];
            LittleEndian::write_u64(&mut b, *v);
            sink.write_all(&b);
        }
        Value::F32(v) => {
            let mut b = [0u8; 4];
            LittleEndian::write_f32(&mut b, *v);
            sink.write_all(&b);
        }
        Value::F64(v) => {
            let mut b = [0u8; 8];
            LittleEndian::write_f64(&mut b, *v);
            sink.write_all(&b);
        }
        Value::Str(s) => {
            let bytes = text::encode_str(s, encoding);
            write_varint(sink, bytes.len() as u64);
            sink.write_all(&bytes);
        }
        Value::Bytes(b) => {
            write_varint(sink, b.len() as u64);
            sink.write_all(b);
        }
    }
}

/// Reads the v1 inline payload for `type_id` at the current position.
pub fn read_v1_payload(
    type_id: u8,
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<Value, FluxionError> {
    Ok(match type_id {
        TYPE_NULL => Value::Null,
        TYPE_TRUE => Value::Bool(true),
        TYPE_FALSE => Value::Bool(false),
        TYPE_U8 => Value::U8(source.read_u8()?),
        TYPE_I8 => Value::I8(source.read_u8()? as i8),
        TYPE_CHAR => Value::Char(LittleEndian::read_u16(source.read_exact(2)?)),
        TYPE_I16 => Value::I16(LittleEndian::read_i16(source.read_exact(2)?)),
        TYPE_U16 => Value::U16(LittleEndian::read_u16(source.read_exact(2)?)),
        TYPE_I32 => Value::I32(LittleEndian::read_i32(source.read_exact(4)?)),
        TYPE_U32 => Value::U32(LittleEndian::read_u32(source.read_exact(4)?)),
        TYPE_I64 => Value::I64(LittleEndian::read_i64(source.read_exact(8)?)),
        TYPE_U64 => Value::U64(LittleEndian::read_u64(source.read_exact(8)?)),
        TYPE_F32 => Value::F32(LittleEndian::read_f32(source.read_exact(4)?)),
        TYPE_F64 => Value::F64(LittleEndian::read_f64(source.read_exact(8)?)),
        TYPE_STR => {
            let len = read_length(source)?;
            Value::Str(text::decode_str(source.read_exact(len)?, encoding)?)
        }
        TYPE_BYTES => {
            let len = read_length(source)?;
            Value::Bytes(source.read_exact(len)?.to_vec())
        }
        other => return Err(FluxionError::UnknownValueType(other)),
    })
}

// -----------------------------------------------------------------------------
// Pooled payload codec (shared by v2 and v3)
// -----------------------------------------------------------------------------

/// Builds the pooled payload bytes for `value`. Signed integers contribute
/// their magnitude only; the sign travels in the v2 tag's unique flag or the
/// v3 pool type byte.
pub fn pooled_payload(value: &Value, encoding: TextEncoding) -> Vec<u8> {
    let mut sink = ByteSink::new();
    match value {
        Value::Null | Value::Bool(_) => {}
        Value::U8(v) => sink.write_u8(*v),
        Value::I8(v) => sink.write_u8(*v as u8),
        Value::Char(v) | Value::U16(v) => write_varint(&mut sink, *v as u64),
        Value::U32(v) => write_varint(&mut sink, *v as u64),
        Value::U64(v) => write_varint(&mut sink, *v),
        Value::I16(v) => write_varint(&mut sink, v.unsigned_abs() as u64),
        Value::I32(v) => write_varint(&mut sink, v.unsigned_abs() as u64),
        Value::I64(v) => write_varint(&mut sink, v.unsigned_abs()),
        Value::F32(v) => {
            let mut b = [0u8; 4];
            LittleEndian::write_f32(&mut b, *v);
            sink.write_all(&b);
        }
        Value::F64(v) => {
            let mut b = [0u8; 8];
            LittleEndian::write_f64(&mut b, *v);
            sink.write_all(&b);
        }
        Value::Str(s) => {
            let bytes = text::encode_str(s, encoding);
            write_varint(&mut sink, bytes.len() as u64);
            sink.write_all(&bytes);
        }
        Value::Bytes(b) => {
            write_varint(&mut sink, b.len() as u64);
            sink.write_all(b);
        }
    }
    sink.into_bytes()
}

/// Reads a pooled payload for `type_id` at the current position. `negative`
/// is the out-of-band sign for i16/i32/i64 and is ignored elsewhere.
pub fn read_pooled_payload(
    type_id: u8,
    negative: bool,
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<Value, FluxionError> {
    Ok(match type_id {
        TYPE_NULL => Value::Null,
        TYPE_TRUE => Value::Bool(true),
        TYPE_FALSE => Value::Bool(false),
        TYPE_U8 => Value::U8(source.read_u8()?),
        TYPE_I8 => Value::I8(source.read_u8()? as i8),
        TYPE_CHAR => Value::Char(narrow_u16(read_varint(source)?)?),
        TYPE_U16 => Value::U16(narrow_u16(read_varint(source)?)?),
        TYPE_U32 => Value::U32(read_varint_u32(source)?),
        TYPE_U64 => Value::U64(read_varint(source)?),
        TYPE_I16 => {
            let mag = read_varint(source)?;
            Value::I16(apply_sign_i16(mag, negative)?)
        }
        TYPE_I32 => {
            let mag = read_varint(source)?;
            Value::I32(apply_sign_i32(mag, negative)?)
        }
        TYPE_I64 => {
            let mag = read_varint(source)?;
            Value::I64(apply_sign_i64(mag, negative)?)
        }
        TYPE_F32 => Value::F32(LittleEndian::read_f32(source.read_exact(4)?)),
        TYPE_F64 => Value::F64(LittleEndian::read_f64(source.read_exact(8)?)),
        TYPE_STR => {
            let len = read_length(source)?;
            Value::Str(text::decode_str(source.read_exact(len)?, encoding)?)
        }
        TYPE_BYTES => {
            let len = read_length(source)?;
            Value::Bytes(source.read_exact(len)?.to_vec())
        }
        other => return Err(FluxionError::UnknownValueType(other)),
    })
}

/// Length prefix: narrowed to 32 bits, then validated against the remaining
/// input before allocation.
fn read_length(source: &mut ByteSource<'_>) -> Result<usize, FluxionError> {
    let len = read_varint_u32(source)? as usize;
    if len > source.remaining() {
        return Err(FluxionError::EndOfStream);
    }
    Ok(len)
}

fn narrow_u16(n: u64) -> Result<u16, FluxionError> {
    u16::try_from(n).map_err(|_| FluxionError::VarintOverflow)
}

fn apply_sign_i16(mag: u64, negative: bool) -> Result<i16, FluxionError> {
    if negative {
        if mag > i16::MIN.unsigned_abs() as u64 {
            return Err(FluxionError::VarintOverflow);
        }
        Ok((mag as i16).wrapping_neg())
    } else {
        if mag > i16::MAX as u64 {
            return Err(FluxionError::VarintOverflow);
        }
        Ok(mag as i16)
    }
}

fn apply_sign_i32(mag: u64, negative: bool) -> Result<i32, FluxionError> {
    if negative {
        if mag > i32::MIN.unsigned_abs() as u64 {
            return Err(FluxionError::VarintOverflow);
        }
        Ok((mag as i32).wrapping_neg())
    } else {
        if mag > i32::MAX as u64 {
            return Err(FluxionError::VarintOverflow);
        }
        Ok(mag as i32)
    }
}

fn apply_sign_i64(mag: u64, negative: bool) -> Result<i64, FluxionError> {
    if negative {
        if mag > i64::MIN.unsigned_abs() {
            return Err(FluxionError::VarintOverflow);
        }
        Ok((mag as i64).wrapping_neg())
    } else {
        if mag > i64::MAX as u64 {
            return Err(FluxionError::VarintOverflow);
        }
        Ok(mag as i64)
    }
}

// -----------------------------------------------------------------------------
// Conversions
// -----------------------------------------------------------------------------

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

impl_from! {
    bool => Bool,
    u8 => U8,
    i8 => I8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(String::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}
